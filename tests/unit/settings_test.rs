//! Unit tests for settings loading and validation.

use std::fs;
use std::path::PathBuf;

use cloudmark::settings::{Settings, ENV_ANON_KEY, ENV_DATA_DIR, ENV_SERVICE_URL};
use cloudmark::types::errors::SettingsError;

fn write_settings(json: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cloudmark.json");
    fs::write(&path, json).expect("write settings file");
    (dir, path)
}

#[test]
fn test_load_reads_file_and_trims_trailing_slash() {
    let (_dir, path) = write_settings(
        r#"{
            "service_url": "https://project.example.com/",
            "anon_key": "public-key",
            "data_dir": "/tmp/cloudmark"
        }"#,
    );

    let settings = Settings::load(&path).expect("settings should load");
    assert_eq!(settings.service_url, "https://project.example.com");
    assert_eq!(settings.anon_key, "public-key");
    assert_eq!(settings.oauth_provider, "google");
    assert_eq!(settings.redirect_to, "");
    assert_eq!(
        settings.session_file(),
        PathBuf::from("/tmp/cloudmark/session.json")
    );
}

#[test]
fn test_load_rejects_non_http_url() {
    let (_dir, path) =
        write_settings(r#"{"service_url": "ftp://nope", "anon_key": "k", "data_dir": "."}"#);
    let err = Settings::load(&path).expect_err("ftp url must be rejected");
    assert!(matches!(err, SettingsError::InvalidUrl(_)));
}

#[test]
fn test_load_rejects_empty_anon_key() {
    let (_dir, path) = write_settings(
        r#"{"service_url": "https://x.example.com", "anon_key": "", "data_dir": "."}"#,
    );
    let err = Settings::load(&path).expect_err("empty key must be rejected");
    assert!(matches!(err, SettingsError::MissingValue(_)));
}

#[test]
fn test_load_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Settings::load(dir.path().join("absent.json")).expect_err("missing file");
    assert!(matches!(err, SettingsError::IoError(_)));
}

#[test]
fn test_load_reports_malformed_file() {
    let (_dir, path) = write_settings("{ not json");
    let err = Settings::load(&path).expect_err("malformed file");
    assert!(matches!(err, SettingsError::SerializationError(_)));
}

// Environment access is process-wide, so every env scenario lives in this one
// test to keep the suite order-independent.
#[test]
fn test_from_env_round_trip() {
    std::env::remove_var(ENV_SERVICE_URL);
    std::env::remove_var(ENV_ANON_KEY);
    let err = Settings::from_env().expect_err("missing env must be rejected");
    assert!(matches!(err, SettingsError::MissingValue(_)));

    std::env::set_var(ENV_SERVICE_URL, "https://project.example.com/");
    std::env::set_var(ENV_ANON_KEY, "public-key");
    std::env::set_var(ENV_DATA_DIR, "/tmp/cloudmark-env");

    let settings = Settings::from_env().expect("env settings should load");
    assert_eq!(settings.service_url, "https://project.example.com");
    assert_eq!(settings.data_dir, PathBuf::from("/tmp/cloudmark-env"));

    std::env::remove_var(ENV_SERVICE_URL);
    std::env::remove_var(ENV_ANON_KEY);
    std::env::remove_var(ENV_DATA_DIR);
}
