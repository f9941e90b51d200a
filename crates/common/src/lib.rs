//! Shared runtime building blocks for DisTrack crates.
//!
//! # Modules
//!
//! - [`auth`]: device-linked credential lifecycle ([`auth::TokenManager`])
//! - [`security`]: platform keychain access (`platform` feature)
//! - [`storage`]: durable plain key/value state
//! - [`time`]: clock abstraction used for expiry arithmetic
//! - [`testing`]: in-memory doubles for the traits above (`test-utils`)
//!
//! # Feature Tiers
//!
//! - `platform` (default): system keychain through the `keyring` crate
//! - `test-utils`: mocks for downstream crates' tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
#[cfg(feature = "platform")]
pub mod security;
pub mod storage;
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    AccessTokenProvider, CredentialSet, DeviceIdentity, RefreshError, SecretStore, TokenGrant,
    TokenManager, TokenManagerError, TokenRefresher,
};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
pub use storage::{JsonFileStateStore, StateStore, StorageError};
pub use time::{Clock, SystemClock};
