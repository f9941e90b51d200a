//! Credential types and auth errors

use std::sync::Arc;

use distrack_domain::constants::ACCESS_TOKEN_EXPIRY_BUFFER_MS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// In-memory view of the device's credentials
///
/// An access token without an expiry is never considered usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Access token expiry, epoch milliseconds
    pub expires_at_ms: Option<i64>,
}

impl CredentialSet {
    /// Credentials of a device that has not been linked
    #[must_use]
    pub const fn unlinked() -> Self {
        Self { access_token: None, refresh_token: None, expires_at_ms: None }
    }

    /// A device is linked while it holds a refresh token
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// The access token, if it stays valid for more than the expiry buffer
    #[must_use]
    pub fn usable_access_token(&self, now_ms: i64) -> Option<&str> {
        match (self.access_token.as_deref(), self.expires_at_ms) {
            (Some(token), Some(expires_at))
                if expires_at.saturating_sub(now_ms) > ACCESS_TOKEN_EXPIRY_BUFFER_MS =>
            {
                Some(token)
            }
            _ => None,
        }
    }
}

/// Tokens issued by the link or refresh endpoints
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent on refresh responses that keep the current refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl TokenGrant {
    /// Grant carrying both tokens
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
            expires_in,
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Failure reported by a [`super::TokenRefresher`]
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The service rejected the refresh token (401/404)
    #[error("refresh token rejected (HTTP {status})")]
    InvalidCredential { status: u16 },

    /// Network failure, timeout or similar condition worth retrying later
    #[error("refresh request failed: {message}")]
    Transient { message: String },

    /// Any other non-success status
    #[error("refresh endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response missing required fields
    #[error("malformed refresh response: {0}")]
    Malformed(String),
}

/// Token manager errors
///
/// `Clone` so every caller sharing one in-flight refresh receives the result.
#[derive(Debug, Clone, Error)]
pub enum TokenManagerError {
    /// A method other than `initialize` was called first
    #[error("token manager not initialized")]
    NotInitialized,

    /// No usable credentials; the device must be linked again
    #[error("device is not linked")]
    NotLinked,

    /// Refresh failed for a reason that leaves credentials intact
    #[error("token refresh failed: {0}")]
    Refresh(Arc<RefreshError>),

    /// Secure store operation failed
    #[error("secret store error: {0}")]
    SecretStore(String),

    /// Plain state store operation failed
    #[error("state store error: {0}")]
    StateStore(String),

    /// The service answered 2xx without required fields
    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

impl TokenManagerError {
    /// Whether the caller should prompt the user to link the device again
    #[must_use]
    pub const fn requires_relink(&self) -> bool {
        matches!(self, Self::NotLinked)
    }
}

impl From<crate::storage::StorageError> for TokenManagerError {
    fn from(err: crate::storage::StorageError) -> Self {
        Self::StateStore(err.to_string())
    }
}
