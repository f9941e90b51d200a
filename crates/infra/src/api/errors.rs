//! API-specific error types
//!
//! Provides error classification for API operations.

use std::time::Duration;

use distrack_common::auth::{RefreshError, TokenManagerError};
use reqwest::StatusCode;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Credentials missing or rejected - the device may need linking
    Authentication,
    /// Rate limiting errors (429) - retry later
    RateLimit,
    /// Server errors (5xx) - retry later
    Server,
    /// Client errors (4xx except auth) and unusable responses
    Client,
    /// Network/connection errors and timeouts - retry later
    Network,
    /// Configuration, local storage and cancellation
    Config,
}

/// API operation errors
///
/// `Clone` so a failure can be recorded on a queued item and still returned.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The service rejected the request even after a token refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Device is not linked")]
    NotLinked,

    #[error("Token manager not initialized")]
    NotInitialized,

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client error (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage failed underneath the request
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// 2xx response whose body does not match the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Get the error category for this error
    pub const fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::NotLinked | Self::NotInitialized => {
                ApiErrorCategory::Authentication
            }
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } | Self::MalformedResponse(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Storage(_) | Self::Cancelled => ApiErrorCategory::Config,
        }
    }

    /// Whether repeating the same request later may succeed
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// HTTP status behind this error, when there was a response
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::RateLimit(_) => Some(429),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a non-success response.
    pub(crate) fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimit(message)
        } else if status.is_server_error() {
            Self::Server { status: status.as_u16(), message }
        } else {
            Self::Client { status: status.as_u16(), message }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // Only `HttpClient::send` knows the configured limit.
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<TokenManagerError> for ApiError {
    fn from(err: TokenManagerError) -> Self {
        match err {
            TokenManagerError::NotLinked => Self::NotLinked,
            TokenManagerError::NotInitialized => Self::NotInitialized,
            TokenManagerError::MalformedResponse(message) => Self::MalformedResponse(message),
            TokenManagerError::SecretStore(message) | TokenManagerError::StateStore(message) => {
                Self::Storage(message)
            }
            TokenManagerError::Refresh(cause) => match cause.as_ref() {
                RefreshError::InvalidCredential { .. } => Self::NotLinked,
                RefreshError::Transient { message } => Self::Network(message.clone()),
                RefreshError::Malformed(message) => Self::MalformedResponse(message.clone()),
                RefreshError::Status { status, body } => {
                    StatusCode::from_u16(*status).map_or_else(
                        |_| Self::Network(format!("refresh returned HTTP {status}")),
                        |code| Self::from_status(code, "token refresh", body),
                    )
                }
            },
        }
    }
}
