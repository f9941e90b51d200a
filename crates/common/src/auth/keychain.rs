//! `SecretStore` backed by the platform keychain.
//!
//! # Module Layering
//!
//! - **`security::keychain`**: generic secret storage via the platform keychain
//! - **`auth::keychain`** (this module): exposes that provider to the token
//!   manager through the `SecretStore` trait, mapping "not found" to `None`
//!
//! This keeps the security module free of auth types.

use async_trait::async_trait;

use crate::auth::traits::SecretStore;
use crate::security::{KeychainError, KeychainProvider};

#[async_trait]
impl SecretStore for KeychainProvider {
    async fn get_secret(&self, key: &str) -> Result<Option<String>, String> {
        match KeychainProvider::get_secret(self, key) {
            Ok(value) => Ok(Some(value)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<(), String> {
        KeychainProvider::set_secret(self, key, value).map_err(|e| e.to_string())
    }

    async fn delete_secret(&self, key: &str) -> Result<(), String> {
        KeychainProvider::delete_secret(self, key).map_err(|e| e.to_string())
    }
}
