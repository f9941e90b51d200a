//! Token manager for device-linked credentials
//!
//! Manages the credential lifecycle:
//! - Device id creation on `initialize`
//! - Lazy credential load from the secret and state stores
//! - Expiry-aware `Authorization` header with a 60 s safety buffer
//! - Single-flight refresh shared by all concurrent callers
//! - Credential wipe when the service rejects the refresh token

use std::sync::Arc;

use async_trait::async_trait;
use distrack_domain::constants::{ACCESS_EXPIRES_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::device::DeviceIdentity;
use super::traits::{AccessTokenProvider, SecretStore, TokenRefresher};
use super::types::{CredentialSet, RefreshError, TokenGrant, TokenManagerError};
use crate::storage::StateStore;
use crate::time::{Clock, SystemClock};

type SharedRefresh = Shared<BoxFuture<'static, Result<(), TokenManagerError>>>;

/// Token manager for one linked device
///
/// Cheap to clone; clones share the same state. Construct once and hand out
/// by `Arc` or clone to collaborators.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    secrets: Arc<dyn SecretStore>,
    state: Arc<dyn StateStore>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    device_id: parking_lot::RwLock<Option<String>>,
    /// `None` until first loaded from the stores
    credentials: RwLock<Option<CredentialSet>>,
    /// Refresh currently in flight, shared by every waiter
    pending_refresh: parking_lot::Mutex<Option<SharedRefresh>>,
}

impl TokenManager {
    /// Create a token manager reading time from the system clock
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        state: Arc<dyn StateStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self::with_clock(secrets, state, refresher, Arc::new(SystemClock))
    }

    /// Create a token manager with an explicit clock
    pub fn with_clock(
        secrets: Arc<dyn SecretStore>,
        state: Arc<dyn StateStore>,
        refresher: Arc<dyn TokenRefresher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                secrets,
                state,
                refresher,
                clock,
                device_id: parking_lot::RwLock::new(None),
                credentials: RwLock::new(None),
                pending_refresh: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Load (or create) the device id. Must be called before anything else.
    ///
    /// Calling it again is harmless.
    ///
    /// # Errors
    /// Returns error if the state store cannot be read or written
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<(), TokenManagerError> {
        if self.inner.device_id.read().is_some() {
            return Ok(());
        }

        let device_id = DeviceIdentity::new(Arc::clone(&self.inner.state)).load_or_create().await?;
        *self.inner.device_id.write() = Some(device_id);
        info!("Token manager initialized");
        Ok(())
    }

    /// The persisted device id
    ///
    /// # Errors
    /// `NotInitialized` before `initialize` completes
    pub fn device_id(&self) -> Result<String, TokenManagerError> {
        self.inner.device_id()
    }

    /// Whether a refresh token is held
    ///
    /// # Errors
    /// `NotInitialized`, or a store failure while loading credentials
    pub async fn has_linked_account(&self) -> Result<bool, TokenManagerError> {
        self.inner.ensure_initialized()?;
        Ok(self.inner.credentials().await?.is_linked())
    }

    /// `Bearer <token>` for a token valid for more than the expiry buffer
    ///
    /// Returns without touching the network while the cached token is valid;
    /// otherwise refreshes once and re-reads the cache.
    ///
    /// # Errors
    /// `NotLinked` if no access token exists after refreshing, or the refresh
    /// failure itself
    pub async fn auth_header(&self) -> Result<String, TokenManagerError> {
        self.inner.ensure_initialized()?;

        if let Some(header) = self.inner.cached_header().await? {
            return Ok(header);
        }

        self.refresh().await?;

        let credentials = self.inner.credentials().await?;
        credentials
            .access_token
            .map(|token| format!("Bearer {token}"))
            .ok_or(TokenManagerError::NotLinked)
    }

    /// Exchange the refresh token for a new grant
    ///
    /// Concurrent callers share one network exchange and observe the same
    /// result. A rejected refresh token (401/404) wipes all credentials and
    /// yields `NotLinked`; other failures leave credentials untouched.
    ///
    /// # Errors
    /// `NotLinked`, `Refresh`, `MalformedResponse` or a store failure
    pub async fn refresh(&self) -> Result<(), TokenManagerError> {
        self.inner.ensure_initialized()?;

        let operation = {
            let mut slot = self.inner.pending_refresh.lock();
            if let Some(in_flight) = slot.as_ref() {
                debug!("Joining in-flight token refresh");
                in_flight.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let operation = async move {
                    let result = inner.run_refresh().await;
                    inner.pending_refresh.lock().take();
                    result
                }
                .boxed()
                .shared();
                *slot = Some(operation.clone());
                operation
            }
        };

        operation.await
    }

    /// Persist a new grant and make it the current credential set
    ///
    /// A grant without a refresh token keeps the one already held.
    ///
    /// # Errors
    /// `NotInitialized` or a store failure
    pub async fn store_tokens(&self, grant: TokenGrant) -> Result<(), TokenManagerError> {
        self.inner.ensure_initialized()?;
        self.inner.store_tokens(grant).await
    }

    /// Remove all credentials (unlink)
    ///
    /// # Errors
    /// `NotInitialized` or a store failure
    pub async fn clear_tokens(&self) -> Result<(), TokenManagerError> {
        self.inner.ensure_initialized()?;
        self.inner.clear_tokens().await
    }
}

impl Inner {
    fn ensure_initialized(&self) -> Result<(), TokenManagerError> {
        if self.device_id.read().is_some() {
            Ok(())
        } else {
            Err(TokenManagerError::NotInitialized)
        }
    }

    fn device_id(&self) -> Result<String, TokenManagerError> {
        self.device_id.read().clone().ok_or(TokenManagerError::NotInitialized)
    }

    async fn credentials(&self) -> Result<CredentialSet, TokenManagerError> {
        if let Some(credentials) = self.credentials.read().await.as_ref() {
            return Ok(credentials.clone());
        }

        let mut slot = self.credentials.write().await;
        if let Some(credentials) = slot.as_ref() {
            return Ok(credentials.clone());
        }

        let loaded = self.load_credentials().await?;
        debug!(linked = loaded.is_linked(), "Credentials loaded from stores");
        *slot = Some(loaded.clone());
        Ok(loaded)
    }

    async fn cached_header(&self) -> Result<Option<String>, TokenManagerError> {
        let credentials = self.credentials().await?;
        let now = self.clock.now_millis();
        Ok(credentials.usable_access_token(now).map(|token| format!("Bearer {token}")))
    }

    async fn load_credentials(&self) -> Result<CredentialSet, TokenManagerError> {
        let access_token = self
            .secrets
            .get_secret(ACCESS_TOKEN_KEY)
            .await
            .map_err(TokenManagerError::SecretStore)?;
        let refresh_token = self
            .secrets
            .get_secret(REFRESH_TOKEN_KEY)
            .await
            .map_err(TokenManagerError::SecretStore)?;
        let expires_at_ms = self.state.get(ACCESS_EXPIRES_KEY).await?.and_then(|v| v.as_i64());

        Ok(CredentialSet { access_token, refresh_token, expires_at_ms })
    }

    #[instrument(skip(self))]
    async fn run_refresh(&self) -> Result<(), TokenManagerError> {
        let refresh_token = self.credentials().await?.refresh_token.ok_or_else(|| {
            debug!("No refresh token held; device is not linked");
            TokenManagerError::NotLinked
        })?;
        let device_id = self.device_id()?;

        match self.refresher.refresh(&device_id, &refresh_token).await {
            Ok(grant) => {
                let grant = TokenGrant {
                    refresh_token: grant.refresh_token.or(Some(refresh_token)),
                    ..grant
                };
                self.store_tokens(grant).await?;
                info!("Access token refreshed");
                Ok(())
            }
            Err(RefreshError::InvalidCredential { status }) => {
                warn!(status, "Refresh token rejected; clearing credentials");
                if let Err(e) = self.clear_tokens().await {
                    warn!(error = %e, "Failed to remove rejected credentials from storage");
                    *self.credentials.write().await = Some(CredentialSet::unlinked());
                }
                Err(TokenManagerError::NotLinked)
            }
            Err(RefreshError::Malformed(message)) => {
                warn!(%message, "Malformed refresh response");
                Err(TokenManagerError::MalformedResponse(message))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed; keeping current credentials");
                Err(TokenManagerError::Refresh(Arc::new(e)))
            }
        }
    }

    async fn store_tokens(&self, grant: TokenGrant) -> Result<(), TokenManagerError> {
        let refresh_token = match grant.refresh_token {
            Some(token) => Some(token),
            None => self.credentials().await?.refresh_token,
        };

        self.secrets
            .set_secret(ACCESS_TOKEN_KEY, &grant.access_token)
            .await
            .map_err(TokenManagerError::SecretStore)?;
        if let Some(token) = refresh_token.as_deref() {
            self.secrets
                .set_secret(REFRESH_TOKEN_KEY, token)
                .await
                .map_err(TokenManagerError::SecretStore)?;
        }

        let expires_at_ms =
            self.clock.now_millis().saturating_add(grant.expires_in.saturating_mul(1000));
        self.state.set(ACCESS_EXPIRES_KEY, Value::from(expires_at_ms)).await?;

        *self.credentials.write().await = Some(CredentialSet {
            access_token: Some(grant.access_token),
            refresh_token,
            expires_at_ms: Some(expires_at_ms),
        });

        debug!(expires_at_ms, "Tokens stored");
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<(), TokenManagerError> {
        self.secrets
            .delete_secret(ACCESS_TOKEN_KEY)
            .await
            .map_err(TokenManagerError::SecretStore)?;
        self.secrets
            .delete_secret(REFRESH_TOKEN_KEY)
            .await
            .map_err(TokenManagerError::SecretStore)?;
        self.state.delete(ACCESS_EXPIRES_KEY).await?;

        *self.credentials.write().await = Some(CredentialSet::unlinked());

        info!("Tokens cleared (device unlinked)");
        Ok(())
    }
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn auth_header(&self) -> Result<String, TokenManagerError> {
        Self::auth_header(self).await
    }

    async fn refresh(&self) -> Result<(), TokenManagerError> {
        Self::refresh(self).await
    }
}
