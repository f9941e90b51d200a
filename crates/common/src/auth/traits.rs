//! Traits for credential storage and token exchange
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (system keychain, token endpoint).

use async_trait::async_trait;

use super::types::{RefreshError, TokenGrant, TokenManagerError};

/// Trait for secret storage operations
///
/// Implemented by the platform keychain and by an in-memory mock for tests.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret
    ///
    /// # Returns
    /// `None` if no secret is stored under `key`
    ///
    /// # Errors
    /// Returns error message if the backend cannot be read
    async fn get_secret(&self, key: &str) -> Result<Option<String>, String>;

    /// Store a secret, replacing any previous value
    ///
    /// # Errors
    /// Returns error message if storage fails
    async fn set_secret(&self, key: &str, value: &str) -> Result<(), String>;

    /// Delete a secret (idempotent)
    ///
    /// # Errors
    /// Returns error message if deletion fails
    async fn delete_secret(&self, key: &str) -> Result<(), String>;
}

/// Trait for exchanging a refresh token at the remote token endpoint
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a new grant
    ///
    /// # Errors
    /// `RefreshError::InvalidCredential` when the service rejects the refresh
    /// token; other variants for transient or unexpected failures
    async fn refresh(&self, device_id: &str, refresh_token: &str)
        -> Result<TokenGrant, RefreshError>;
}

/// Source of `Authorization` header values for authenticated requests
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Header value (`Bearer <token>`) backed by a currently valid token
    ///
    /// # Errors
    /// `TokenManagerError::NotLinked` when no credentials are available
    async fn auth_header(&self) -> Result<String, TokenManagerError>;

    /// Force a token refresh after the service rejected the current token
    ///
    /// # Errors
    /// Propagates the refresh failure
    async fn refresh(&self) -> Result<(), TokenManagerError>;
}
