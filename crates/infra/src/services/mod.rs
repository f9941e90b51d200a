//! Service wiring
//!
//! [`DisTrackServices`] builds the token manager, API clients and session
//! queue from a [`Config`] and owns them for the life of the host process.
//! Everything shares one base URL resolver and one credential set.

use std::sync::Arc;
use std::time::Duration;

use distrack_common::auth::{SecretStore, TokenManager, TokenManagerError};
use distrack_common::security::KeychainProvider;
use distrack_common::storage::{JsonFileStateStore, StateStore};
use distrack_common::time::{Clock, SystemClock};
use distrack_core::{SessionQueue, SessionQueueConfig};
use distrack_domain::Config;
use tracing::info;

use crate::api::{
    AccountApi, ApiClient, ApiClientConfig, ApiError, AuthApi, BaseUrlResolver, LinkClient,
    SessionsApi,
};
use crate::http::HttpClient;

pub struct DisTrackServices {
    pub tokens: TokenManager,
    pub queue: SessionQueue,
    pub link: LinkClient,
    pub account: AccountApi,
    pub api: Arc<ApiClient>,
}

impl DisTrackServices {
    /// Wire production services: platform keychain and a JSON state file
    ///
    /// # Errors
    /// `ApiError::Config` if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let secrets = Arc::new(KeychainProvider::new(config.storage.keychain_service.clone()));
        let state = Arc::new(JsonFileStateStore::new(config.storage.state_file()));
        Self::with_stores(config, secrets, state, Arc::new(SystemClock))
    }

    /// Wire services over explicit stores and clock
    ///
    /// # Errors
    /// `ApiError::Config` if the HTTP client cannot be built
    pub fn with_stores(
        config: &Config,
        secrets: Arc<dyn SecretStore>,
        state: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiError> {
        let base_url = Arc::new(BaseUrlResolver::from_config(&config.api));
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .build()?;

        let refresher = Arc::new(AuthApi::new(http_client.clone(), Arc::clone(&base_url)));
        let tokens =
            TokenManager::with_clock(secrets, Arc::clone(&state), refresher, Arc::clone(&clock));

        let api = Arc::new(ApiClient::new(
            ApiClientConfig::from(&config.api),
            Arc::clone(&base_url),
            Arc::new(tokens.clone()),
        )?);

        let uploader = Arc::new(SessionsApi::new(Arc::clone(&api)));
        let queue = SessionQueue::with_clock(
            state,
            uploader,
            SessionQueueConfig::from(&config.queue),
            clock,
        );

        Ok(Self {
            tokens,
            queue,
            link: LinkClient::new(http_client, base_url),
            account: AccountApi::new(Arc::clone(&api)),
            api,
        })
    }

    /// Load the device identity and start the periodic queue flush
    ///
    /// # Errors
    /// Returns error if the device id cannot be loaded or created
    pub async fn start(&self) -> Result<(), TokenManagerError> {
        self.tokens.initialize().await?;
        self.queue.start();
        info!("DisTrack services started");
        Ok(())
    }

    /// Stop the periodic flush; queued sessions stay on disk
    pub async fn shutdown(&self) {
        self.queue.stop().await;
        info!("DisTrack services stopped");
    }
}
