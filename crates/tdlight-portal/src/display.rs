//! Text renderings shared by every front end.

use tdlight_common::entities::ConfidenceBand;
use tdlight_common::{CelestialObject, ClassificationResult};

fn fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "-".to_string(),
    }
}

/// Position line of an object-list row: `RA: 10.500° DEC: -5.250°`.
pub fn position_label(obj: &CelestialObject) -> String {
    format!("RA: {}° DEC: {}°", fixed(obj.ra, 3), fixed(obj.dec, 3))
}

/// Metadata panel of the object being viewed.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataView {
    pub source_id: String,
    pub healpix_id: String,
    pub ra: String,
    pub dec: String,
    pub object_class: String,
    pub point_count: String,
}

impl MetadataView {
    pub fn new(obj: &CelestialObject, point_count: usize) -> Self {
        let degrees = |v: Option<f64>| match v {
            Some(v) if v.is_finite() => format!("{:.4}°", v),
            _ => "-".to_string(),
        };
        Self {
            source_id: non_empty_or_dash(obj.source_id.as_str()),
            healpix_id: non_empty_or_dash(obj.healpix_id.as_deref().unwrap_or_default()),
            ra: degrees(obj.ra),
            dec: degrees(obj.dec),
            object_class: obj
                .object_class
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            point_count: if point_count > 0 { point_count.to_string() } else { "-".to_string() },
        }
    }
}

fn non_empty_or_dash(s: &str) -> String {
    if s.is_empty() { "-".to_string() } else { s.to_string() }
}

/// One row of the classification results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub source_id: String,
    pub position: String,
    pub prediction: String,
    pub confidence: String,
    pub band: ConfidenceBand,
    pub class_color: &'static str,
}

impl From<&ClassificationResult> for ResultRow {
    fn from(res: &ClassificationResult) -> Self {
        Self {
            source_id: res.source_id.to_string(),
            position: format!("{}°, {}°", fixed(res.ra, 2), fixed(res.dec, 2)),
            prediction: res.prediction.clone(),
            confidence: fixed(Some(res.confidence), 4),
            band: res.confidence_band(),
            class_color: class_color(&res.prediction),
        }
    }
}

/// Badge colour for a predicted variability class.
pub fn class_color(prediction: &str) -> &'static str {
    match prediction {
        "RRAB"     => "#ef4444",
        "RRC"      => "#f97316",
        "DSCT"     => "#f59e0b",
        "CEP"      => "#eab308",
        "M"        => "#84cc16",
        "SR"       => "#22c55e",
        "EA"       => "#14b8a6",
        "EW"       => "#06b6d4",
        "ROT"      => "#3b82f6",
        "Non-var"  => "#6b7280",
        "Variable" => "#8b5cf6",
        _          => "#64748b",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn region_list_position_format() {
        let obj = CelestialObject::new("123").with_position(10.5, -5.25);
        assert_eq!(position_label(&obj), "RA: 10.500° DEC: -5.250°");
    }

    #[test]
    fn missing_coordinates_render_as_dash() {
        let obj = CelestialObject::new("9");
        assert_eq!(position_label(&obj), "RA: -° DEC: -°");
    }

    #[test]
    fn metadata_defaults_class_to_unknown() {
        let obj = CelestialObject::new("42").with_position(1.0, 2.0).with_healpix("7");
        let view = MetadataView::new(&obj, 0);
        assert_eq!(view.object_class, "UNKNOWN");
        assert_eq!(view.ra, "1.0000°");
        assert_eq!(view.point_count, "-");
    }

    #[test]
    fn result_row_formatting() {
        let res = ClassificationResult {
            source_id: "5".into(),
            healpix_id: None,
            ra: Some(12.3456),
            dec: Some(-1.0),
            prediction: "EW".into(),
            confidence: 0.91234,
            data_points: None,
        };
        let row = ResultRow::from(&res);
        assert_eq!(row.position, "12.35°, -1.00°");
        assert_eq!(row.confidence, "0.9123");
        assert_eq!(row.band, ConfidenceBand::High);
        assert_eq!(row.class_color, "#06b6d4");
    }
}
