//! Tests for config loading and environment overrides.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use tms_client::config::{ClientConfig, DEFAULT_BASE_URL};
use tms_client::error::TmsError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = ClientConfig::load_from(&tmp.path().join("config.yml")).unwrap();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert!(config.request_timeout().is_none());
}

#[test]
fn empty_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yml");
    std::fs::write(&path, "\n").unwrap();
    assert_eq!(ClientConfig::load_from(&path).unwrap().base_url, DEFAULT_BASE_URL);
}

#[test]
fn yaml_fields_are_read() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yml");
    std::fs::write(
        &path,
        "base_url: https://tms.internal/api/v1\ndownload_dir: /srv/exports\nrequest_timeout_secs: 30\n",
    )
    .unwrap();

    let config = ClientConfig::load_from(&path).unwrap();
    assert_eq!(config.base_url, "https://tms.internal/api/v1");
    assert_eq!(config.download_dir(), PathBuf::from("/srv/exports"));
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn malformed_yaml_is_reported_with_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yml");
    std::fs::write(&path, "base_url: [unterminated\n").unwrap();

    match ClientConfig::load_from(&path).unwrap_err() {
        TmsError::ConfigParse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ConfigParse, got {other:?}"),
    }
}

#[test]
fn environment_overrides_file_values() {
    let mut config = ClientConfig::default();
    config.apply_overrides(lookup(&[
        ("TMS_API_BASE_URL", "http://staging:9000/api/v1"),
        ("TMS_TOKEN_PATH", "/run/tms/token"),
        ("TMS_DOWNLOAD_DIR", "/tmp/exports"),
        ("TMS_REQUEST_TIMEOUT_SECS", "5"),
    ]));

    assert_eq!(config.base_url, "http://staging:9000/api/v1");
    assert_eq!(config.token_path(), PathBuf::from("/run/tms/token"));
    assert_eq!(config.download_dir(), PathBuf::from("/tmp/exports"));
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn blank_and_invalid_overrides_are_ignored() {
    let mut config = ClientConfig {
        request_timeout_secs: Some(10),
        ..ClientConfig::default()
    };
    config.apply_overrides(lookup(&[
        ("TMS_API_BASE_URL", "  "),
        ("TMS_REQUEST_TIMEOUT_SECS", "soon"),
    ]));

    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.request_timeout_secs, Some(10));
}
