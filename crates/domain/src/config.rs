//! Configuration management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEYCHAIN_SERVICE, DEFAULT_REQUEST_TIMEOUT_SECS, FLUSH_INTERVAL_SECS, MAX_QUEUE_ITEMS,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Explicit base URL; takes precedence over the environment and link file
    #[serde(default)]
    pub base_url: Option<String>,
    /// File whose trimmed contents are the base URL
    #[serde(default)]
    pub link_file: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Local persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the plain state file
    pub state_dir: PathBuf,
    /// Service name used to namespace keychain entries
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,
}

/// Offline session queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl StorageConfig {
    /// Path of the JSON file backing the plain state store
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            link_file: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".distrack"),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { flush_interval_secs: FLUSH_INTERVAL_SECS, max_items: MAX_QUEUE_ITEMS }
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_keychain_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

fn default_flush_interval_secs() -> u64 {
    FLUSH_INTERVAL_SECS
}

fn default_max_items() -> usize {
    MAX_QUEUE_ITEMS
}
