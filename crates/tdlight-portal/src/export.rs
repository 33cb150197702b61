//! CSV exports of the object list and the current light curve.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tdlight_common::{CelestialObject, LightCurvePoint, Result};
use tracing::{error, info};

use crate::notice::NoticeKind;
use crate::portal::Portal;

pub const OBJECT_LIST_FILE: &str = "object_list.csv";

pub fn light_curve_file_name(source_id: &str) -> String {
    format!("lightcurve_{}.csv", source_id)
}

#[derive(Serialize)]
struct ObjectRow<'a> {
    source_id: &'a str,
    ra: Option<f64>,
    dec: Option<f64>,
    healpix_id: Option<&'a str>,
    object_class: &'a str,
    band: &'a str,
}

#[derive(Serialize)]
struct LightCurveRow<'a> {
    timestamp: &'a str,
    mag: Option<f64>,
    mag_err: Option<f64>,
    flux: Option<f64>,
    flux_err: Option<f64>,
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or(default)
}

/// Write `objects` as `source_id,ra,dec,healpix_id,object_class,band`.
/// Returns the number of data rows.
pub fn write_object_list<'a, W: Write>(
    writer: W,
    objects: impl IntoIterator<Item = &'a CelestialObject>,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for obj in objects {
        wtr.serialize(ObjectRow {
            source_id: obj.source_id.as_str(),
            ra: obj.ra,
            dec: obj.dec,
            healpix_id: obj.healpix_id.as_deref(),
            object_class: or_default(&obj.object_class, "UNKNOWN"),
            band: or_default(&obj.band, "Unknown"),
        })?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}

/// Write `points` as `timestamp,mag,mag_err,flux,flux_err`.
pub fn write_light_curve<W: Write>(writer: W, points: &[LightCurvePoint]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for p in points {
        wtr.serialize(LightCurveRow {
            timestamp: &p.timestamp,
            mag: p.magnitude,
            mag_err: p.magnitude_error,
            flux: p.flux,
            flux_err: p.flux_error,
        })?;
    }
    wtr.flush()?;
    Ok(points.len())
}

impl Portal {
    /// Export the object list into `dir`. Nothing is written when the list
    /// is empty.
    pub fn export_object_list(&mut self, dir: &Path) -> Option<PathBuf> {
        if self.state.selection.is_empty() {
            self.notify(NoticeKind::ExportEmpty);
            return None;
        }
        let path = dir.join(OBJECT_LIST_FILE);
        let written = File::create(&path)
            .map_err(Into::into)
            .and_then(|file| write_object_list(file, self.state.selection.objects()));
        self.report_export(path, written)
    }

    /// Export the light curve being viewed into `dir`.
    pub fn export_light_curve(&mut self, dir: &Path) -> Option<PathBuf> {
        let Some(curve) = self.state.light_curve.as_ref().filter(|c| !c.is_empty()) else {
            self.notify(NoticeKind::ExportNoLightCurve);
            return None;
        };
        let path = dir.join(light_curve_file_name(curve.source_id.as_str()));
        let written = File::create(&path)
            .map_err(Into::into)
            .and_then(|file| write_light_curve(file, &curve.points));
        self.report_export(path, written)
    }

    fn report_export(&mut self, path: PathBuf, written: Result<usize>) -> Option<PathBuf> {
        match written {
            Ok(rows) => {
                info!(path = %path.display(), rows, "Export written");
                self.notify(NoticeKind::ExportWritten { path: path.display().to_string(), rows });
                Some(path)
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "Export failed");
                self.notify(NoticeKind::ExportFailed(e.user_message()));
                None
            }
        }
    }
}
