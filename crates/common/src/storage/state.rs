//! Plain (non-secret) durable state
//!
//! [`StateStore`] is the key/value seam used for the device id, token expiry
//! and the session queue. [`JsonFileStateStore`] keeps the whole document in
//! one JSON file; a value counts as stored only once it is on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::error::{StorageError, StorageResult};

/// Key/value store for non-secret durable state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Remove `key` (idempotent)
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// State store persisted as one JSON object on disk
///
/// The document is loaded lazily on first access and cached. Every mutation
/// rewrites the whole file through a temporary sibling followed by a rename,
/// so readers never observe a partially written document.
pub struct JsonFileStateStore {
    path: PathBuf,
    cache: Mutex<Option<Map<String, Value>>>,
}

impl JsonFileStateStore {
    /// Create a store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: Mutex::new(None) }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<Map<String, Value>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "State file does not exist yet");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        if data.is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&data)? {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::Corrupted(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    #[instrument(skip(self, document), fields(path = %self.path.display(), keys = document.len()))]
    async fn save(&self, document: &Map<String, Value>) -> StorageResult<()> {
        let data = serde_json::to_vec_pretty(document)?;

        // Write to temporary file first for atomicity
        let temp_path = self.path.with_extension("tmp");

        if let Some(parent) = temp_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file =
            fs::OpenOptions::new().write(true).create(true).truncate(true).open(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        debug!(bytes = data.len(), "State persisted");
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache.as_ref().and_then(|document| document.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut cache = self.cache.lock().await;
        let mut document = match cache.as_ref() {
            Some(document) => document.clone(),
            None => self.load().await?,
        };

        document.insert(key.to_string(), value);
        // The cache only moves forward once the document is on disk.
        self.save(&document).await?;
        *cache = Some(document);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut cache = self.cache.lock().await;
        let mut document = match cache.as_ref() {
            Some(document) => document.clone(),
            None => self.load().await?,
        };

        if document.remove(key).is_some() {
            self.save(&document).await?;
        }
        *cache = Some(document);
        Ok(())
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
