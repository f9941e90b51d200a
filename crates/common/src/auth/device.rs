//! Stable device identifier
//!
//! A random UUID (v4) generated on first use and kept in the plain state
//! store for the lifetime of the installation. It scopes linking and refresh
//! calls to this device.

use std::sync::Arc;

use distrack_domain::constants::DEVICE_ID_KEY;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::{StateStore, StorageResult};

/// Loads or creates the persisted device id
#[derive(Clone)]
pub struct DeviceIdentity {
    store: Arc<dyn StateStore>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Return the stored id, generating and persisting one if absent
    ///
    /// # Errors
    /// Returns error if the state store cannot be read or written
    pub async fn load_or_create(&self) -> StorageResult<String> {
        if let Some(Value::String(existing)) = self.store.get(DEVICE_ID_KEY).await? {
            if !existing.is_empty() {
                debug!("Loaded existing device id");
                return Ok(existing);
            }
        }

        let device_id = Uuid::new_v4().to_string();
        self.store.set(DEVICE_ID_KEY, Value::String(device_id.clone())).await?;
        info!(device_id = %device_id, "Generated new device id");
        Ok(device_id)
    }
}
