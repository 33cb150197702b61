use super::*;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_empty_file_gives_defaults() {
    let settings = Settings::from_toml_str("").unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.backend.base_url, "http://127.0.0.1:5001");
    assert_eq!(settings.search.limit, 200);
    assert_eq!(settings.classification.results_limit, 500);
    assert_eq!(settings.import.default_db, "gaiadr2_lc");
    assert_eq!(settings.auto_classify.batch_size, 5000);
}

#[test]
fn test_partial_sections_keep_field_defaults() {
    let settings = Settings::from_toml_str(
        r#"
        [backend]
        base_url = "http://survey-host:5001"

        [import]
        threads = 8
        "#,
    )
    .unwrap();
    assert_eq!(settings.backend.base_url, "http://survey-host:5001");
    assert_eq!(settings.backend.request_timeout_secs, 60);
    assert_eq!(settings.import.threads, 8);
    assert_eq!(settings.import.vgroups, 32);
    assert_eq!(settings.import.nside, 64);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[classification]\nresults_delay_ms = 250").unwrap();
    let settings = Settings::load_from(file.path()).unwrap();
    assert_eq!(settings.classification.results_delay().as_millis(), 250);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Settings::load_from("/definitely/not/here/tdlight.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = Settings::from_toml_str("[backend\nbase_url = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_env_override_replaces_backend_url() {
    let mut settings = Settings::default();
    settings.apply_env_overrides(|key| {
        (key == BACKEND_URL_ENV).then(|| " http://10.1.2.3:5001 ".to_string())
    });
    assert_eq!(settings.backend.base_url, "http://10.1.2.3:5001");
}

#[test]
fn test_blank_env_override_is_ignored() {
    let mut settings = Settings::default();
    settings.apply_env_overrides(|_| Some("   ".to_string()));
    assert_eq!(settings.backend.base_url, default_base_url());
}

#[test]
fn test_rejects_non_http_url_and_zero_batch() {
    assert!(matches!(
        Settings::from_toml_str("[backend]\nbase_url = \"ftp://x\"").unwrap_err(),
        ConfigError::Invalid(_)
    ));
    assert!(matches!(
        Settings::from_toml_str("[auto_classify]\nbatch_size = 0").unwrap_err(),
        ConfigError::Invalid(_)
    ));
}
