//! Client-side mirrors of backend-owned records.
//!
//! None of these are persisted; they exist only for the lifetime of a
//! session and are refreshed from the backend on demand.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

// ── Identifiers ─────────────────────────────────────────────

/// Catalog source identifier, always held in its decimal string form.
///
/// Survey identifiers exceed 2^53, so they are never routed through a
/// float. The backend sends them either as JSON strings or as integers;
/// both normalise to the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<u64> for SourceId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::Text(s) => Ok(SourceId::new(s)),
            StringOrNumber::Unsigned(n) => Ok(SourceId(n.to_string())),
            StringOrNumber::Signed(n) => Ok(SourceId(n.to_string())),
            StringOrNumber::Float(n) => Ok(SourceId(n.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// Accepts `"123"`, `123` or `null` for fields the backend is inconsistent about.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Text(s)) => Some(s),
        Some(StringOrNumber::Unsigned(n)) => Some(n.to_string()),
        Some(StringOrNumber::Signed(n)) => Some(n.to_string()),
        Some(StringOrNumber::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

// ── Objects ─────────────────────────────────────────────────

/// One catalog object as returned by the search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialObject {
    pub source_id: SourceId,
    #[serde(default)]
    pub ra: Option<f64>,
    #[serde(default)]
    pub dec: Option<f64>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub healpix_id: Option<String>,
    /// Opaque key of the per-object light-curve table.
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub object_class: Option<String>,
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub data_count: Option<u64>,
}

impl CelestialObject {
    pub fn new(source_id: impl Into<SourceId>) -> Self {
        Self {
            source_id: source_id.into(),
            ra: None,
            dec: None,
            healpix_id: None,
            table_name: None,
            object_class: None,
            band: None,
            data_count: None,
        }
    }

    pub fn with_position(mut self, ra: f64, dec: f64) -> Self {
        self.ra = Some(ra);
        self.dec = Some(dec);
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    pub fn with_healpix(mut self, healpix_id: impl Into<String>) -> Self {
        self.healpix_id = Some(healpix_id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.object_class = Some(class.into());
        self
    }

    /// Both coordinates, if the backend supplied them.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.ra, self.dec) {
            (Some(ra), Some(dec)) if ra.is_finite() && dec.is_finite() => Some((ra, dec)),
            _ => None,
        }
    }

    /// Overlay fresher metadata. Fields the fresh copy leaves empty keep
    /// their current value.
    pub fn merge_from(&mut self, fresh: &CelestialObject) {
        fn take<T: Clone>(slot: &mut Option<T>, fresh: &Option<T>) {
            if fresh.is_some() {
                slot.clone_from(fresh);
            }
        }
        take(&mut self.ra, &fresh.ra);
        take(&mut self.dec, &fresh.dec);
        take(&mut self.healpix_id, &fresh.healpix_id);
        take(&mut self.table_name, &fresh.table_name);
        take(&mut self.object_class, &fresh.object_class);
        take(&mut self.band, &fresh.band);
        take(&mut self.data_count, &fresh.data_count);
    }
}

// ── Light curves ────────────────────────────────────────────

/// A single photometric measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCurvePoint {
    #[serde(rename = "ts")]
    pub timestamp: String,
    #[serde(rename = "mag", default)]
    pub magnitude: Option<f64>,
    #[serde(rename = "mag_err", default)]
    pub magnitude_error: Option<f64>,
    #[serde(default)]
    pub flux: Option<f64>,
    #[serde(rename = "flux_err", default)]
    pub flux_error: Option<f64>,
    #[serde(default)]
    pub band: Option<String>,
}

impl LightCurvePoint {
    /// Parsed observation time. The backend emits second-resolution UTC
    /// without a zone suffix.
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
    }
}

/// Light curve of the currently viewed object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightCurve {
    pub source_id: SourceId,
    pub points: Vec<LightCurvePoint>,
}

impl LightCurve {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distinct bands in first-seen order.
    pub fn bands(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for band in self.points.iter().filter_map(|p| p.band.as_deref()) {
            if !seen.contains(&band) {
                seen.push(band);
            }
        }
        seen
    }

    /// Earliest and latest parseable observation times.
    pub fn observation_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut times = self.points.iter().filter_map(LightCurvePoint::observed_at);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

// ── Classification ──────────────────────────────────────────

/// Model prediction for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub source_id: SourceId,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub healpix_id: Option<String>,
    #[serde(default)]
    pub ra: Option<f64>,
    #[serde(default)]
    pub dec: Option<f64>,
    pub prediction: String,
    pub confidence: f64,
    #[serde(default)]
    pub data_points: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ClassificationResult {
    pub fn confidence_band(&self) -> ConfidenceBand {
        if self.confidence > 0.8 {
            ConfidenceBand::High
        } else if self.confidence > 0.6 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}
