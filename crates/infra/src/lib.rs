//! # DisTrack Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP transport and the authenticated API client
//! - Token refresh, linking, session upload and account endpoints
//! - Configuration loading and tracing setup
//! - Wiring of the token manager and session queue
//!
//! ## Architecture
//! - Implements traits defined in `distrack-common` and `distrack-core`
//! - Contains all network I/O

pub mod api;
pub mod config;
pub mod http;
pub mod observability;
pub mod services;

// Re-export commonly used items
pub use api::{
    AccountApi, ApiClient, ApiError, ApiErrorCategory, AuthApi, BaseUrlResolver, LinkClient,
    LinkError, LinkPoll, LinkSession, RequestOptions, SessionsApi,
};
pub use http::HttpClient;
pub use observability::{init_tracing, init_tracing_with, LogFormat};
pub use services::DisTrackServices;

/// Serialises tests that mutate process environment variables
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
