//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `DISTRACK_STATE_DIR` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DISTRACK_STATE_DIR`: Directory for the plain state file (required)
//! - `DISTRACK_API_BASE_URL`: Remote service base URL
//! - `DISTRACK_LINK_FILE`: File containing the base URL
//! - `DISTRACK_REQUEST_TIMEOUT_SECS`: Default HTTP timeout in seconds
//! - `DISTRACK_KEYCHAIN_SERVICE`: Keychain service name
//! - `DISTRACK_FLUSH_INTERVAL_SECS`: Session queue flush interval in seconds
//! - `DISTRACK_QUEUE_MAX_ITEMS`: Session queue capacity
//!
//! ## File Locations
//! The loader probes `distrack.{json,toml}` and `config.{json,toml}` in the
//! current directory, its two parents, and the same three levels relative to
//! the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use distrack_domain::{ApiConfig, Config, DisTrackError, QueueConfig, Result, StorageConfig};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["distrack.json", "distrack.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DisTrackError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `DISTRACK_STATE_DIR` is required; every other value falls back to
/// its default.
///
/// # Errors
/// Returns `DisTrackError::Config` if the state directory is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let state_dir = PathBuf::from(env_var("DISTRACK_STATE_DIR")?);

    let api_defaults = ApiConfig::default();
    let api = ApiConfig {
        base_url: env_opt("DISTRACK_API_BASE_URL"),
        link_file: env_opt("DISTRACK_LINK_FILE").map(PathBuf::from),
        request_timeout_secs: env_parse("DISTRACK_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(api_defaults.request_timeout_secs),
    };

    let storage = StorageConfig {
        state_dir,
        keychain_service: env_opt("DISTRACK_KEYCHAIN_SERVICE")
            .unwrap_or_else(|| StorageConfig::default().keychain_service),
    };

    let queue_defaults = QueueConfig::default();
    let queue = QueueConfig {
        flush_interval_secs: env_parse("DISTRACK_FLUSH_INTERVAL_SECS")?
            .unwrap_or(queue_defaults.flush_interval_secs),
        max_items: env_parse("DISTRACK_QUEUE_MAX_ITEMS")?.unwrap_or(queue_defaults.max_items),
    };

    Ok(Config { api, storage, queue })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DisTrackError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DisTrackError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DisTrackError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DisTrackError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DisTrackError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DisTrackError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DisTrackError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| candidates_under(root))
        .find(|path| path.exists())
}

fn candidates_under(root: &Path) -> Vec<PathBuf> {
    ["", "..", "../.."]
        .iter()
        .flat_map(|up| CONFIG_FILE_NAMES.iter().map(move |name| root.join(up).join(name)))
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        DisTrackError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty environment variable, if set
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional numeric environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| DisTrackError::Config(format!("Invalid {key}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::env_lock;

    const ALL_VARS: [&str; 7] = [
        "DISTRACK_STATE_DIR",
        "DISTRACK_API_BASE_URL",
        "DISTRACK_LINK_FILE",
        "DISTRACK_REQUEST_TIMEOUT_SECS",
        "DISTRACK_KEYCHAIN_SERVICE",
        "DISTRACK_FLUSH_INTERVAL_SECS",
        "DISTRACK_QUEUE_MAX_ITEMS",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_with_defaults() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var("DISTRACK_STATE_DIR", "/tmp/distrack-state");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.storage.state_dir, PathBuf::from("/tmp/distrack-state"));
        assert_eq!(config.storage.keychain_service, "DisTrack");
        assert_eq!(config.api.base_url, None);
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.queue, QueueConfig::default());
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var("DISTRACK_STATE_DIR", "/tmp/s");
        std::env::set_var("DISTRACK_API_BASE_URL", "https://api.test");
        std::env::set_var("DISTRACK_FLUSH_INTERVAL_SECS", "15");
        std::env::set_var("DISTRACK_QUEUE_MAX_ITEMS", "20");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.api.base_url.as_deref(), Some("https://api.test"));
        assert_eq!(config.queue.flush_interval_secs, 15);
        assert_eq!(config.queue.max_items, 20);
    }

    #[test]
    fn test_missing_state_dir() {
        let _guard = env_lock();
        clear_env();

        let result = load_from_env();
        assert!(matches!(
            result,
            Err(DisTrackError::Config(msg)) if msg.contains("DISTRACK_STATE_DIR")
        ));
    }

    #[test]
    fn test_invalid_number() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var("DISTRACK_STATE_DIR", "/tmp/s");
        std::env::set_var("DISTRACK_QUEUE_MAX_ITEMS", "lots");

        let result = load_from_env();
        clear_env();

        assert!(matches!(
            result,
            Err(DisTrackError::Config(msg)) if msg.contains("DISTRACK_QUEUE_MAX_ITEMS")
        ));
    }

    #[test]
    fn test_parse_toml() {
        let contents = r#"
            [storage]
            state_dir = "/var/lib/distrack"

            [api]
            base_url = "https://api.test"
        "#;

        let config = parse_config(contents, Path::new("distrack.toml")).unwrap();

        assert_eq!(config.storage.state_dir, PathBuf::from("/var/lib/distrack"));
        assert_eq!(config.api.base_url.as_deref(), Some("https://api.test"));
        assert_eq!(config.queue.max_items, 500);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = parse_config("", Path::new("config.yaml"));
        assert!(matches!(result, Err(DisTrackError::Config(msg)) if msg.contains("yaml")));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/distrack.json")));
        assert!(matches!(result, Err(DisTrackError::Config(msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"storage": {{"state_dir": "/tmp/x", "keychain_service": "Dev"}}}}"#)
            .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.storage.keychain_service, "Dev");
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_candidates_cover_parents() {
        let candidates = candidates_under(Path::new("/work/app"));
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], PathBuf::from("/work/app/distrack.json"));
        assert!(candidates.contains(&PathBuf::from("/work/app/../../config.toml")));
    }
}
