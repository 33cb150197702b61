//! Typed stand-ins for the settings and import forms.
//!
//! Fields stay as the text the user typed. Numbers are coerced only when a
//! request is built, with the same leniency as the web front end: a leading
//! numeric prefix is accepted, and zero or garbage falls back to a default.

use tdlight_client::{ImportKind, ImportRequest};
use tdlight_common::backend_config::{BackendConfig, ConfigUpdate};

fn default_port() -> u16 { 6041 }
fn default_threads() -> u32 { 16 }
fn default_vgroups() -> u32 { 32 }
fn default_threshold() -> f64 { 0.95 }
fn default_nside() -> u32 { 64 }
fn default_batch_size() -> u32 { 5000 }

/// The leading `[+-]digits[.digits][e[+-]digits]` run of `s`.
fn numeric_prefix(s: &str, allow_fraction: bool) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_from = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut seen_digit = end > digits_from;
    if allow_fraction {
        if bytes.get(end) == Some(&b'.') {
            let mut frac_end = end + 1;
            while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
                frac_end += 1;
            }
            if seen_digit || frac_end > end + 1 {
                seen_digit = true;
                end = frac_end;
            }
        }
        if seen_digit && matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits = exp_end;
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            if exp_end > exp_digits {
                end = exp_end;
            }
        }
    }
    if seen_digit { &s[..end] } else { "" }
}

/// Leading integer of `text`, or `default` if there is none or it is not
/// positive.
///
/// Negative input such as `-3` also falls back to `default` on purpose:
/// every field parsed here is a port, a worker count or a size, and none
/// of those accept a negative value.
pub fn parse_int_or<T>(text: &str, default: T) -> T
where
    T: TryFrom<i64>,
{
    numeric_prefix(text.trim(), false)
        .parse::<i64>()
        .ok()
        .filter(|&v| v > 0)
        .and_then(|v| T::try_from(v).ok())
        .unwrap_or(default)
}

/// Leading decimal number of `text`, or `default` if there is none or it
/// is zero.
pub fn parse_float_or(text: &str, default: f64) -> f64 {
    numeric_prefix(text.trim(), true)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(default)
}

// ── Settings form ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigForm {
    pub db_name: String,
    pub db_host: String,
    pub db_port: String,
    pub db_user: String,
    pub threads: String,
    pub vgroups: String,
    pub threshold: String,
    pub model_path: String,
}

impl Default for ConfigForm {
    fn default() -> Self {
        Self {
            db_name: String::new(),
            db_host: String::new(),
            db_port: String::new(),
            db_user: String::new(),
            threads: default_threads().to_string(),
            vgroups: default_vgroups().to_string(),
            threshold: default_threshold().to_string(),
            model_path: String::new(),
        }
    }
}

impl ConfigForm {
    /// Overwrite every field from a fetched backend config. Absent import
    /// and threshold values show their defaults; other absent values show
    /// as blank.
    pub fn fill_from(&mut self, cfg: &BackendConfig) {
        let db = &cfg.database;
        self.db_name = db.name.clone().unwrap_or_default();
        self.db_host = db.host.clone().unwrap_or_default();
        self.db_port = db.port.filter(|&p| p > 0).map(|p| p.to_string()).unwrap_or_default();
        self.db_user = db.user.clone().unwrap_or_default();
        self.threads = cfg
            .import
            .threads
            .filter(|&t| t > 0)
            .unwrap_or_else(default_threads)
            .to_string();
        self.vgroups = cfg
            .import
            .vgroups
            .filter(|&v| v > 0)
            .unwrap_or_else(default_vgroups)
            .to_string();
        self.threshold = cfg
            .classification
            .confidence_threshold
            .filter(|&t| t != 0.0)
            .unwrap_or_else(default_threshold)
            .to_string();
        self.model_path = cfg.classification.model_path.clone().unwrap_or_default();
    }

    /// Body for `POST /api/config`. Import settings are left out when
    /// applying, so the backend keeps its own.
    pub fn to_update(&self, include_import: bool) -> ConfigUpdate {
        ConfigUpdate {
            db_name: self.db_name.clone(),
            db_host: self.db_host.clone(),
            db_port: parse_int_or(&self.db_port, default_port()),
            threads: include_import.then(|| self.threads_value()),
            vgroups: include_import.then(|| self.vgroups_value()),
            confidence_threshold: parse_float_or(&self.threshold, default_threshold()),
        }
    }

    pub fn threads_value(&self) -> u32 {
        parse_int_or(&self.threads, default_threads())
    }

    pub fn vgroups_value(&self) -> u32 {
        parse_int_or(&self.vgroups, default_vgroups())
    }
}

// ── Import form ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ImportForm {
    pub catalog_path: String,
    pub lightcurve_path: String,
    pub coords_path: String,
    pub db_name: String,
    pub nside: String,
    pub batch_size: String,
}

impl Default for ImportForm {
    fn default() -> Self {
        Self {
            catalog_path: String::new(),
            lightcurve_path: String::new(),
            coords_path: String::new(),
            db_name: String::new(),
            nside: default_nside().to_string(),
            batch_size: default_batch_size().to_string(),
        }
    }
}

impl ImportForm {
    pub fn nside_value(&self) -> u32 {
        parse_int_or(&self.nside, default_nside())
    }

    pub fn batch_size_value(&self) -> u32 {
        parse_int_or(&self.batch_size, default_batch_size())
    }

    pub fn db_name(&self) -> &str {
        self.db_name.trim()
    }

    /// Start request for `kind`. Worker counts come from the settings form.
    pub fn request(&self, kind: ImportKind, config: &ConfigForm) -> ImportRequest {
        let path = match kind {
            ImportKind::Catalog    => &self.catalog_path,
            ImportKind::Lightcurve => &self.lightcurve_path,
        };
        ImportRequest {
            kind,
            path: path.trim().to_string(),
            coords_path: self.coords_path.trim().to_string(),
            db_name: self.db_name().to_string(),
            nside: self.nside_value(),
            threads: config.threads_value(),
            vgroups: config.vgroups_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_parsing_is_lenient() {
        assert_eq!(parse_int_or::<u16>("6030", 6041), 6030);
        assert_eq!(parse_int_or::<u16>(" 6030abc", 6041), 6030);
        assert_eq!(parse_int_or::<u16>("", 6041), 6041);
        assert_eq!(parse_int_or::<u16>("abc", 6041), 6041);
        assert_eq!(parse_int_or::<u16>("0", 6041), 6041);
        assert_eq!(parse_int_or::<u16>("-3", 6041), 6041);
        assert_eq!(parse_int_or::<i64>("-3", 16), 16);
        assert_eq!(parse_int_or::<u16>("70000", 6041), 6041);
        assert_eq!(parse_int_or::<u32>("12.7", 16), 12);
    }

    #[test]
    fn float_parsing_is_lenient() {
        assert_eq!(parse_float_or("0.9", 0.95), 0.9);
        assert_eq!(parse_float_or(".8x", 0.95), 0.8);
        assert_eq!(parse_float_or("1e-1", 0.95), 0.1);
        assert_eq!(parse_float_or("0", 0.95), 0.95);
        assert_eq!(parse_float_or("high", 0.95), 0.95);
        assert_eq!(parse_float_or("inf", 0.95), 0.95);
    }

    #[test]
    fn fill_from_uses_defaults_for_missing_values() {
        let mut form = ConfigForm::default();
        form.threads = "4".into();
        let cfg = BackendConfig::default();
        form.fill_from(&cfg);
        assert_eq!(form.threads, "16");
        assert_eq!(form.vgroups, "32");
        assert_eq!(form.threshold, "0.95");
        assert_eq!(form.db_port, "");
    }

    #[test]
    fn apply_update_omits_import_settings() {
        let form = ConfigForm { db_port: "".into(), ..ConfigForm::default() };
        let update = form.to_update(false);
        assert_eq!(update.db_port, 6041);
        assert_eq!(update.threads, None);
        assert_eq!(form.to_update(true).vgroups, Some(32));
    }

    #[test]
    fn import_request_takes_workers_from_settings() {
        let settings = ConfigForm { threads: "8".into(), vgroups: "x".into(), ..ConfigForm::default() };
        let form = ImportForm {
            lightcurve_path: " /data/lc ".into(),
            coords_path: "/data/coords.csv".into(),
            nside: "".into(),
            ..ImportForm::default()
        };
        let req = form.request(ImportKind::Lightcurve, &settings);
        assert_eq!(req.path, "/data/lc");
        assert_eq!(req.threads, 8);
        assert_eq!(req.vgroups, 32);
        assert_eq!(req.nside, 64);
    }
}
