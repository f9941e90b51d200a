//! Authenticated API client
//!
//! Every request carries the current `Authorization` header from an
//! [`AccessTokenProvider`]. A 401 answer triggers one token refresh and one
//! retry of the same request; a second 401 is returned to the caller.
//! Timeouts and cancellation surface as their own errors and are never
//! retried.

use std::sync::Arc;
use std::time::Duration;

use distrack_common::auth::AccessTokenProvider;
use distrack_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use distrack_domain::ApiConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::base_url::BaseUrlResolver;
use super::errors::ApiError;
use crate::http::HttpClient;

/// Attempts per logical request: the original plus one after a refresh
const MAX_AUTH_ATTEMPTS: u32 = 2;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Timeout for requests that do not set their own
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS) }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self { timeout: Duration::from_secs(config.request_timeout_secs) }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    body: Option<Value>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `body` as JSON
    ///
    /// # Errors
    /// `ApiError::Config` if the body cannot be serialized
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("failed to serialize request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// API client for authenticated endpoints
pub struct ApiClient {
    http_client: HttpClient,
    base_url: Arc<BaseUrlResolver>,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn new(
        config: ApiClientConfig,
        base_url: Arc<BaseUrlResolver>,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self { http_client, base_url, auth, config })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Send one logical request and return the successful response
    ///
    /// Non-success statuses are mapped onto [`ApiError`]; the body of a
    /// successful response is left for the caller. The timeout and cancel
    /// token cover the whole request, including reading the auth header and
    /// any token refresh.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` after a 401 on the retried attempt
    /// - `NotLinked` when no credentials exist or the refresh was rejected
    /// - `Timeout` / `Cancelled` when the request did not finish
    /// - the status-derived variant for any other non-success status
    #[instrument(skip(self, options), fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let attempts = tokio::time::timeout(timeout, self.send_with_retry(&method, path, &options));

        let outcome = match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("request cancelled");
                    return Err(ApiError::Cancelled);
                }
                outcome = attempts => outcome,
            },
            None => attempts.await,
        };

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(ApiError::Timeout(_))) | Err(_) => {
                warn!(?timeout, "request timed out");
                Err(ApiError::Timeout(timeout))
            }
            Ok(Err(err)) => Err(err),
        }
    }

    /// Execute a GET request and decode the JSON body
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path, RequestOptions::new()).await?;
        let result = decode_json(response).await?;
        info!(path = %path, "GET request successful");
        Ok(result)
    }

    /// Execute a POST request with a JSON body and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let options = RequestOptions::new().json(body)?;
        let response = self.request(Method::POST, path, options).await?;
        let result = decode_json(response).await?;
        info!(path = %path, "POST request successful");
        Ok(result)
    }

    async fn send_with_retry(
        &self,
        method: &Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        let url = self.base_url.url_for(path).await?;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let auth_header = self.auth.auth_header().await?;
            let response = self.send_once(method, &url, &auth_header, options).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if attempt < MAX_AUTH_ATTEMPTS {
                    debug!(attempt, "request unauthorized, refreshing token");
                    self.auth.refresh().await?;
                    continue;
                }
                warn!(attempt, "request unauthorized after token refresh");
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &url, &body));
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &url, &body));
            }

            debug!(%status, attempt, "request succeeded");
            return Ok(response);
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        auth_header: &str,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        let mut headers = options.headers.clone();
        let authorization = HeaderValue::from_str(auth_header)
            .map_err(|_| ApiError::Config("authorization header is not valid ASCII".to_string()))?;
        headers.insert(AUTHORIZATION, authorization);

        let mut builder = self.http_client.request(method.clone(), url);
        if let Some(body) = &options.body {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ApiError::Config(format!("failed to serialize request body: {e}")))?;
            builder = builder.body(bytes);
        }

        self.http_client.send(builder.headers(headers)).await
    }
}

/// Decode a successful response body; 204/205 decode from JSON `null`.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return serde_json::from_value(Value::Null).map_err(|_| {
            ApiError::MalformedResponse(format!(
                "No content response ({}), but the response type needs a body",
                status.as_u16()
            ))
        });
    }

    let bytes = response.bytes().await.map_err(ApiError::from)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::MalformedResponse(format!("Failed to parse response: {e}")))
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    base_url: Option<Arc<BaseUrlResolver>>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the base URL resolver
    pub fn base_url(mut self, base_url: Arc<BaseUrlResolver>) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the authentication provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let base_url =
            self.base_url.ok_or_else(|| ApiError::Config("Base URL not set".to_string()))?;
        let auth =
            self.auth.ok_or_else(|| ApiError::Config("Auth provider not set".to_string()))?;

        ApiClient::new(config, base_url, auth)
    }
}
