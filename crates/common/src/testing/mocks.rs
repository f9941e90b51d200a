//! Mock implementations of the auth and storage traits
//!
//! Provides in-memory doubles for testing purposes.

#![allow(clippy::missing_errors_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::auth::{RefreshError, SecretStore, TokenGrant, TokenRefresher};
use crate::storage::{StateStore, StorageError, StorageResult};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// In-memory keychain with the same semantics as the platform provider
///
/// Clones share storage.
#[derive(Debug, Clone)]
pub struct MockKeychainProvider {
    storage: StorageData,
    service_name: String,
}

impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { storage: Arc::new(Mutex::new(HashMap::new())), service_name: service_name.into() }
    }

    /// Service name this mock was created with
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Direct read for assertions.
    #[must_use]
    pub fn secret(&self, key: &str) -> Option<String> {
        self.storage.lock().get(key).cloned()
    }

    /// Number of stored secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.lock().len()
    }

    /// Whether no secrets are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }
}

impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("distrack-test")
    }
}

#[async_trait]
impl SecretStore for MockKeychainProvider {
    async fn get_secret(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.storage.lock().get(key).cloned())
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<(), String> {
        self.storage.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_secret(&self, key: &str) -> Result<(), String> {
        self.storage.lock().remove(key);
        Ok(())
    }
}

/// In-memory plain state store
///
/// Writes can be made to fail to exercise storage error paths. Clones share
/// storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
    fail_writes: Arc<Mutex<bool>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set`/`delete` calls fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if *self.fail_writes.lock() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.check_writable()?;
        self.values.lock().insert(key.to_string(), value);
        *self.writes.lock() += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.values.lock().remove(key);
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// Scripted token refresher that records every call
///
/// Responses are consumed in order; an empty script yields a transient error.
#[derive(Debug, Clone, Default)]
pub struct MockTokenRefresher {
    script: Arc<Mutex<VecDeque<Result<TokenGrant, RefreshError>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockTokenRefresher {
    /// Create a refresher with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful grant
    pub fn push_ok(&self, grant: TokenGrant) {
        self.script.lock().push_back(Ok(grant));
    }

    /// Queue a failure
    pub fn push_err(&self, error: RefreshError) {
        self.script.lock().push_back(Err(error));
    }

    /// Sleep this long inside every call before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of refresh calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// `(device_id, refresh_token)` of every call, in order
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(
        &self,
        device_id: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError> {
        self.calls.lock().push((device_id.to_string(), refresh_token.to_string()));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| {
            Err(RefreshError::Transient { message: "no scripted refresh response".to_string() })
        })
    }
}
