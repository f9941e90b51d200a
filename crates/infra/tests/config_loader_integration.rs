//! Integration tests for configuration loader
//!
//! Loads a config file and wires services from it.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use distrack_common::testing::{MemoryStateStore, MockClock, MockKeychainProvider};
use distrack_infra::{config, DisTrackServices};
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
        [api]
        base_url = "https://api.distrack.test/"
        request_timeout_secs = 10

        [storage]
        state_dir = "/tmp/distrack-it"
        keychain_service = "DisTrackTest"

        [queue]
        flush_interval_secs = 30
        max_items = 100
    "#;

    let mut temp_file = NamedTempFile::with_suffix(".toml").expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.api.base_url.as_deref(), Some("https://api.distrack.test/"));
    assert_eq!(config.api.request_timeout_secs, 10);
    assert_eq!(config.storage.state_file(), PathBuf::from("/tmp/distrack-it/state.json"));
    assert_eq!(config.storage.keychain_service, "DisTrackTest");
    assert_eq!(config.queue.flush_interval_secs, 30);
    assert_eq!(config.queue.max_items, 100);
}

#[test]
fn test_invalid_json_is_rejected() {
    let mut temp_file = NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    temp_file.write_all(b"{ not json").expect("Failed to write to temp file");

    let result = config::load_from_file(Some(temp_file.path().to_path_buf()));

    assert!(result.is_err());
}

#[tokio::test]
async fn test_services_start_from_loaded_config() {
    let mut temp_file = NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    let contents = br#"{
        "api": {"base_url": "http://127.0.0.1:9"},
        "storage": {"state_dir": "/tmp/d"}
    }"#;
    temp_file.write_all(contents).expect("Failed to write to temp file");
    let config = config::load_from_file(Some(temp_file.path().to_path_buf())).unwrap();

    let services = DisTrackServices::with_stores(
        &config,
        Arc::new(MockKeychainProvider::default()),
        Arc::new(MemoryStateStore::new()),
        Arc::new(MockClock::new()),
    )
    .unwrap();

    services.start().await.unwrap();
    assert!(services.queue.is_running());
    assert!(!services.tokens.device_id().unwrap().is_empty());
    assert!(!services.tokens.has_linked_account().await.unwrap());

    services.shutdown().await;
    assert!(!services.queue.is_running());
}
