//! Canned catalog data shared by the workspace tests.

use tdlight_common::backend_config::{
    BackendConfig, ClassificationSection, DatabaseSection, HealpixSection, WebSection,
};
use tdlight_common::{CelestialObject, ClassificationResult, LightCurvePoint};

pub const NEAR_CONE_ID: &str = "4295806720";
pub const LARGE_ID: &str = "6917528997577384320";

pub fn table_for(healpix: &str, source_id: &str) -> String {
    format!("sensor_data_{}_{}", healpix, source_id)
}

fn object(source_id: &str, healpix: &str, ra: f64, dec: f64) -> CelestialObject {
    let mut obj = CelestialObject::new(source_id)
        .with_position(ra, dec)
        .with_healpix(healpix)
        .with_table(table_for(healpix, source_id));
    obj.data_count = Some(120);
    obj
}

/// Two objects near (10.5, -5.25), one in the northern sky, one far south.
pub fn sample_catalog() -> Vec<CelestialObject> {
    let mut eclipsing = object(LARGE_ID, "1001", 10.6, -5.3);
    eclipsing.object_class = Some("EW".into());
    eclipsing.band = Some("G".into());
    vec![
        object(NEAR_CONE_ID, "1001", 10.5, -5.25),
        eclipsing,
        object("123", "2042", 45.0, 20.0),
        object("456", "3307", 200.0, -60.0),
    ]
}

pub fn sample_light_curve(points: usize) -> Vec<LightCurvePoint> {
    (0..points)
        .map(|i| LightCurvePoint {
            timestamp: format!("2015-03-{:02}T12:00:00", (i % 28) + 1),
            magnitude: Some(15.0 + (i as f64) * 0.01),
            magnitude_error: Some(0.01),
            flux: Some(1200.0 - i as f64),
            flux_error: Some(3.5),
            band: Some(if i % 2 == 0 { "G" } else { "BP" }.to_string()),
        })
        .collect()
}

pub fn sample_results() -> Vec<ClassificationResult> {
    vec![
        ClassificationResult {
            source_id: NEAR_CONE_ID.into(),
            healpix_id: Some("1001".into()),
            ra: Some(10.5),
            dec: Some(-5.25),
            prediction: "RRL".into(),
            confidence: 0.93,
            data_points: Some(120),
        },
        ClassificationResult {
            source_id: LARGE_ID.into(),
            healpix_id: Some("1001".into()),
            ra: Some(10.6),
            dec: Some(-5.3),
            prediction: "EW".into(),
            confidence: 0.71,
            data_points: Some(120),
        },
    ]
}

pub fn sample_config() -> BackendConfig {
    BackendConfig {
        database: DatabaseSection {
            host: Some("localhost".into()),
            port: Some(6030),
            user: Some("root".into()),
            name: Some("gaiadr2_lc".into()),
        },
        classification: ClassificationSection {
            model_path: Some("models/lgbm_111w_model.pkl".into()),
            confidence_threshold: Some(0.95),
            update_database: Some(true),
        },
        healpix: HealpixSection {
            nside: Some(64),
            scheme: Some("nested".into()),
        },
        web: WebSection { port: Some(5001) },
        ..BackendConfig::default()
    }
}
