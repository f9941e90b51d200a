//! Device-linked credential lifecycle
//!
//! A device is linked once it holds a refresh token. The access token is
//! short-lived and refreshed on demand; both tokens live in a [`SecretStore`]
//! while the expiry timestamp and device id live in the plain
//! [`StateStore`](crate::storage::StateStore).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  Credential state machine + single-flight refresh
//! └────────┬────────┘
//!          │
//!          ├──► SecretStore      (keychain: access/refresh tokens)
//!          ├──► StateStore       (expiry, device id)
//!          ├──► TokenRefresher   (POST /v1/auth/refresh, implemented in infra)
//!          └──► Clock            (expiry arithmetic)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use distrack_common::auth::{TokenGrant, TokenManager, TokenRefresher};
//! use distrack_common::security::KeychainProvider;
//! use distrack_common::storage::JsonFileStateStore;
//!
//! async fn link(refresher: Arc<dyn TokenRefresher>) -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TokenManager::new(
//!         Arc::new(KeychainProvider::new("DisTrack")),
//!         Arc::new(JsonFileStateStore::new("/tmp/distrack/state.json")),
//!         refresher,
//!     );
//!     manager.initialize().await?;
//!
//!     // Tokens obtained from the linking flow
//!     manager.store_tokens(TokenGrant::new("access", "refresh", 3600)).await?;
//!
//!     let header = manager.auth_header().await?;
//!     assert!(header.starts_with("Bearer "));
//!     Ok(())
//! }
//! ```

pub mod device;
#[cfg(feature = "platform")]
mod keychain;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use device::DeviceIdentity;
pub use token_manager::TokenManager;
pub use traits::{AccessTokenProvider, SecretStore, TokenRefresher};
pub use types::{CredentialSet, RefreshError, TokenGrant, TokenManagerError};
