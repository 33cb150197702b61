//! Request and response bodies of the backend HTTP API.

use serde::{Deserialize, Serialize};
use tdlight_common::backend_config::BackendConfig;
use tdlight_common::{
    CelestialObject, ClassificationResult, LightCurvePoint, Result, SourceId, TdlightError,
};

// ── Acknowledgements ────────────────────────────────────────

/// Generic `{success, message?, error?}` reply. Endpoints add their own
/// extras, which are collected here as optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub config: Option<BackendConfig>,
}

impl Ack {
    /// Turn `success: false` into [`TdlightError::Rejected`].
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(TdlightError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

// ── Search ──────────────────────────────────────────────────

fn default_limit() -> u32 { 200 }

/// `GET /api/cone_search` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConeQuery {
    pub ra: f64,
    pub dec: f64,
    pub radius: f64,
    pub limit: u32,
}

impl ConeQuery {
    pub fn new(ra: f64, dec: f64, radius: f64) -> Self {
        Self { ra, dec, radius, limit: default_limit() }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.ra.is_finite() && self.dec.is_finite() && self.radius.is_finite()) {
            return Err(TdlightError::InvalidInput("cone search needs numeric RA, DEC and radius".into()));
        }
        if self.radius <= 0.0 {
            return Err(TdlightError::InvalidInput("cone radius must be positive".into()));
        }
        Ok(())
    }
}

/// `GET /api/region_search` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionQuery {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
    pub limit: u32,
}

impl RegionQuery {
    pub fn new(ra_min: f64, ra_max: f64, dec_min: f64, dec_max: f64) -> Self {
        Self { ra_min, ra_max, dec_min, dec_max, limit: default_limit() }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = [self.ra_min, self.ra_max, self.dec_min, self.dec_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(TdlightError::InvalidInput("region search needs four numeric bounds".into()));
        }
        if self.ra_min >= self.ra_max || self.dec_min >= self.dec_max {
            return Err(TdlightError::InvalidInput("region minimum must be below maximum".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ObjectList {
    #[serde(default)]
    pub objects: Vec<CelestialObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DatabaseList {
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub current: Option<String>,
}

const SYSTEM_DATABASES: [&str; 2] = ["information_schema", "performance_schema"];

impl DatabaseList {
    /// User databases, with the engine's own schemas hidden.
    pub fn user_databases(&self) -> Vec<&str> {
        self.databases
            .iter()
            .map(String::as_str)
            .filter(|db| !SYSTEM_DATABASES.contains(db))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DbNameBody<'a> {
    pub db_name: &'a str,
}

// ── Light curves ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LightCurveResponse {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub data: Vec<LightCurvePoint>,
}

// ── Classification ──────────────────────────────────────────

/// Per-object payload of `POST /api/classify_objects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyTarget {
    pub source_id: SourceId,
    pub healpix_id: Option<String>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
}

impl From<&CelestialObject> for ClassifyTarget {
    fn from(obj: &CelestialObject) -> Self {
        Self {
            source_id: obj.source_id.clone(),
            healpix_id: obj.healpix_id.clone(),
            ra: obj.ra,
            dec: obj.dec,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ClassifyBody<'a> {
    pub objects: &'a [ClassifyTarget],
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassifyStarted {
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ClassifyResults {
    #[serde(default)]
    pub results: Vec<ClassificationResult>,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Import ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Catalog,
    Lightcurve,
}

/// Body of `POST /api/import/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(rename = "type")]
    pub kind: ImportKind,
    pub path: String,
    pub coords_path: String,
    pub db_name: String,
    pub nside: u32,
    pub threads: u32,
    pub vgroups: u32,
}

impl ImportRequest {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(TdlightError::InvalidInput(match self.kind {
                ImportKind::Catalog    => "catalog directory path is required".into(),
                ImportKind::Lightcurve => "light-curve directory path is required".into(),
            }));
        }
        if self.coords_path.trim().is_empty() {
            return Err(TdlightError::InvalidInput("coordinates file path is required".into()));
        }
        Ok(())
    }
}

// ── Auto-classification ─────────────────────────────────────

/// Body of `POST /api/auto_classify/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoClassifyRequest {
    pub resume: bool,
    pub batch_size: u32,
    pub db_name: String,
}

/// Reply of `GET /api/auto_classify/candidates`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Candidates {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failed_ack_prefers_error_text() {
        let ack: Ack = serde_json::from_str(r#"{"success":false,"error":"Queue is empty"}"#).unwrap();
        match ack.into_result() {
            Err(TdlightError::Rejected(msg)) => assert_eq!(msg, "Queue is empty"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn region_bounds_must_be_ordered() {
        assert!(RegionQuery::new(10.0, 20.0, -5.0, 5.0).validate().is_ok());
        assert!(RegionQuery::new(20.0, 10.0, -5.0, 5.0).validate().is_err());
        assert!(RegionQuery::new(10.0, 20.0, 5.0, 5.0).validate().is_err());
        assert!(RegionQuery::new(f64::NAN, 20.0, -5.0, 5.0).validate().is_err());
    }

    #[test]
    fn cone_rejects_non_numeric_input() {
        assert!(ConeQuery::new(f64::NAN, 0.0, 1.0).validate().is_err());
        assert!(ConeQuery::new(1.0, 0.0, 0.0).validate().is_err());
        assert!(ConeQuery::new(1.0, 0.0, 0.1).validate().is_ok());
    }

    #[test]
    fn import_request_uses_type_key() {
        let req = ImportRequest {
            kind: ImportKind::Lightcurve,
            path: "/data/lc".into(),
            coords_path: "/data/coords.csv".into(),
            db_name: "gaiadr2_lc".into(),
            nside: 64,
            threads: 16,
            vgroups: 32,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["type"], "lightcurve");
        assert_eq!(v["coords_path"], "/data/coords.csv");
    }

    #[test]
    fn import_requires_both_paths() {
        let mut req = ImportRequest {
            kind: ImportKind::Catalog,
            path: " ".into(),
            coords_path: "/c.csv".into(),
            db_name: String::new(),
            nside: 64,
            threads: 16,
            vgroups: 32,
        };
        assert!(req.validate().is_err());
        req.path = "/cat".into();
        req.coords_path.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn system_databases_are_hidden() {
        let list = DatabaseList {
            databases: vec![
                "information_schema".into(),
                "gaiadr2_lc".into(),
                "performance_schema".into(),
                "ztf".into(),
            ],
            current: None,
        };
        assert_eq!(list.user_databases(), vec!["gaiadr2_lc", "ztf"]);
    }

    #[test]
    fn classify_target_serialises_id_as_string() {
        let obj = CelestialObject::new("6917528997577384320")
            .with_healpix("3")
            .with_position(1.0, 2.0);
        let v = serde_json::to_value(ClassifyTarget::from(&obj)).unwrap();
        assert_eq!(v["source_id"], "6917528997577384320");
        assert_eq!(v["healpix_id"], "3");
    }
}
