//! Device linking flow
//!
//! 1. [`LinkClient::start`] registers the device and returns a short code the
//!    user enters on the website, plus a poll token.
//! 2. [`LinkClient::finish`] is polled with that token until the website side
//!    completes, yielding the first token grant.
//! 3. [`LinkClient::wait_for_link`] drives the polling and hands the grant to
//!    the [`TokenManager`].
//!
//! None of these calls carry an access token.

use std::sync::Arc;
use std::time::Duration;

use distrack_common::auth::{TokenGrant, TokenManager, TokenManagerError};
use distrack_domain::constants::{
    DEFAULT_LINK_POLL_INTERVAL_SECS, EXTENSION_LINK_PATH, LINK_FINISH_PATH, LINK_START_PATH,
};
use distrack_domain::LinkedUser;
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::base_url::BaseUrlResolver;
use super::client::decode_json;
use super::errors::ApiError;
use crate::http::HttpClient;

#[derive(Debug, Error)]
pub enum LinkError {
    /// The link code expired or was rejected; start over
    #[error("link session expired")]
    Expired,

    #[error("linking cancelled")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to store linked credentials: {0}")]
    Token(#[from] TokenManagerError),
}

/// A pending link started with [`LinkClient::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSession {
    pub poll_token: String,
    /// Code shown to the user
    pub link_code: String,
    pub verification_url: Option<String>,
    /// Lifetime of the code in seconds
    pub expires_in: u64,
    pub poll_interval: Duration,
}

/// Outcome of one [`LinkClient::finish`] poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPoll {
    Linked(TokenGrant),
    Pending,
}

#[derive(Serialize)]
struct StartRequest<'a> {
    device_id: &'a str,
}

#[derive(Serialize)]
struct FinishRequest<'a> {
    device_id: &'a str,
    poll_token: &'a str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct StartResponse {
    #[serde(default)]
    poll_token: Option<String>,
    #[serde(default, alias = "code")]
    link_code: Option<String>,
    #[serde(default)]
    verification_url: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    poll_interval: Option<u64>,
}

#[derive(Deserialize)]
struct FinishResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::MalformedResponse(format!("missing {field}")))
}

impl StartResponse {
    fn into_session(self) -> Result<LinkSession, ApiError> {
        Ok(LinkSession {
            poll_token: required(self.poll_token.filter(|t| !t.is_empty()), "poll_token")?,
            link_code: required(self.link_code.filter(|c| !c.is_empty()), "link_code")?,
            verification_url: self.verification_url,
            expires_in: required(self.expires_in.filter(|s| *s > 0), "expires_in")?,
            poll_interval: Duration::from_secs(
                self.poll_interval.filter(|s| *s > 0).unwrap_or(DEFAULT_LINK_POLL_INTERVAL_SECS),
            ),
        })
    }
}

impl FinishResponse {
    fn into_grant(self) -> Result<TokenGrant, ApiError> {
        Ok(TokenGrant::new(
            required(self.access_token.filter(|t| !t.is_empty()), "access_token")?,
            required(self.refresh_token.filter(|t| !t.is_empty()), "refresh_token")?,
            required(self.expires_in.filter(|s| *s > 0), "expires_in")?,
        ))
    }
}

pub struct LinkClient {
    http_client: HttpClient,
    base_url: Arc<BaseUrlResolver>,
}

impl LinkClient {
    pub const fn new(http_client: HttpClient, base_url: Arc<BaseUrlResolver>) -> Self {
        Self { http_client, base_url }
    }

    /// Begin linking `device_id`
    ///
    /// # Errors
    /// `LinkError::Api` for transport failures, error statuses and responses
    /// missing the poll token, code or lifetime
    #[instrument(skip(self))]
    pub async fn start(&self, device_id: &str) -> Result<LinkSession, LinkError> {
        let response = self.post(LINK_START_PATH, &StartRequest { device_id }).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await.into());
        }

        let session = decode_json::<StartResponse>(response).await?.into_session()?;
        info!(expires_in = session.expires_in, "link started");
        Ok(session)
    }

    /// Poll once for completion
    ///
    /// # Errors
    /// `LinkError::Expired` on 400/410, `LinkError::Api` otherwise
    #[instrument(skip_all)]
    pub async fn finish(&self, device_id: &str, poll_token: &str) -> Result<LinkPoll, LinkError> {
        let response = self.post(LINK_FINISH_PATH, &FinishRequest { device_id, poll_token }).await?;

        let status = response.status();
        match status.as_u16() {
            404 | 409 | 425 => Ok(LinkPoll::Pending),
            400 | 410 => Err(LinkError::Expired),
            _ if status.is_success() => {
                let grant = decode_json::<FinishResponse>(response).await?.into_grant()?;
                Ok(LinkPoll::Linked(grant))
            }
            _ => Err(status_error(response).await.into()),
        }
    }

    /// Poll until the link completes and store the resulting tokens
    ///
    /// Polls every `session.poll_interval` until linked, the server reports
    /// the code expired, `session.expires_in` elapses, or `cancel` fires.
    ///
    /// # Errors
    /// `Expired`, `Cancelled`, a poll failure, or a failure storing tokens
    #[instrument(skip_all)]
    pub async fn wait_for_link(
        &self,
        tokens: &TokenManager,
        session: &LinkSession,
        cancel: &CancellationToken,
    ) -> Result<(), LinkError> {
        let device_id = tokens.device_id()?;
        let deadline = Instant::now() + Duration::from_secs(session.expires_in);

        loop {
            if cancel.is_cancelled() {
                return Err(LinkError::Cancelled);
            }

            let poll = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LinkError::Cancelled),
                poll = self.finish(&device_id, &session.poll_token) => poll?,
            };

            if let LinkPoll::Linked(grant) = poll {
                tokens.store_tokens(grant).await?;
                info!("device linked");
                return Ok(());
            }

            if Instant::now() + session.poll_interval > deadline {
                warn!("link code expired before confirmation");
                return Err(LinkError::Expired);
            }

            debug!(interval = ?session.poll_interval, "link pending");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LinkError::Cancelled),
                () = tokio::time::sleep(session.poll_interval) => {}
            }
        }
    }

    /// Exchange a website-issued link code for the account it belongs to
    ///
    /// # Errors
    /// `LinkError::Expired` if the code is unknown or used, `LinkError::Api`
    /// otherwise
    #[instrument(skip_all)]
    pub async fn verify_code(&self, code: &str) -> Result<LinkedUser, LinkError> {
        let response = self.post(EXTENSION_LINK_PATH, &VerifyRequest { code }).await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(LinkError::Expired),
            status if status.is_success() => Ok(decode_json(response).await?),
            _ => Err(status_error(response).await.into()),
        }
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.url_for(path).await?;
        self.http_client.send(self.http_client.request(Method::POST, url).json(body)).await
    }
}

async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    ApiError::from_status(status, &url, &body)
}
