//! Token endpoint client
//!
//! [`AuthApi`] implements [`TokenRefresher`] against
//! `POST /v1/auth/refresh`. It talks to the plain HTTP client: the refresh
//! call itself never carries an access token.

use std::sync::Arc;

use async_trait::async_trait;
use distrack_common::auth::{RefreshError, TokenGrant, TokenRefresher};
use distrack_domain::constants::REFRESH_PATH;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::base_url::BaseUrlResolver;
use crate::http::HttpClient;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    device_id: &'a str,
    refresh_token: &'a str,
}

/// Raw refresh response; required fields are checked after decoding
#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl RefreshResponse {
    fn into_grant(self) -> Result<TokenGrant, RefreshError> {
        let access_token = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| RefreshError::Malformed("missing access_token".to_string()))?;
        let expires_in = self
            .expires_in
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                RefreshError::Malformed("missing or non-positive expires_in".to_string())
            })?;

        Ok(TokenGrant {
            access_token,
            refresh_token: self.refresh_token.filter(|token| !token.is_empty()),
            expires_in,
        })
    }
}

pub struct AuthApi {
    http_client: HttpClient,
    base_url: Arc<BaseUrlResolver>,
}

impl AuthApi {
    pub const fn new(http_client: HttpClient, base_url: Arc<BaseUrlResolver>) -> Self {
        Self { http_client, base_url }
    }
}

#[async_trait]
impl TokenRefresher for AuthApi {
    #[instrument(skip_all)]
    async fn refresh(
        &self,
        device_id: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError> {
        let url = self
            .base_url
            .url_for(REFRESH_PATH)
            .await
            .map_err(|e| RefreshError::Transient { message: e.to_string() })?;

        let request = self
            .http_client
            .request(Method::POST, &url)
            .json(&RefreshRequest { device_id, refresh_token });
        let response = self
            .http_client
            .send(request)
            .await
            .map_err(|e| RefreshError::Transient { message: e.to_string() })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            warn!(%status, "refresh token rejected");
            return Err(RefreshError::InvalidCredential { status: status.as_u16() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Status { status: status.as_u16(), body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RefreshError::Transient { message: e.to_string() })?;
        let parsed: RefreshResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RefreshError::Malformed(format!("invalid JSON: {e}")))?;

        let grant = parsed.into_grant()?;
        debug!(
            expires_in = grant.expires_in,
            rotated = grant.refresh_token.is_some(),
            "token refreshed"
        );
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn api_for(server: &MockServer) -> AuthApi {
        AuthApi::new(HttpClient::new().unwrap(), Arc::new(BaseUrlResolver::fixed(server.uri())))
    }

    async fn respond(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sends_device_and_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({"device_id": "dev-1", "refresh_token": "R1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A2",
                "refresh_token": "R2",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = api_for(&server).await.refresh("dev-1", "R1").await.unwrap();

        assert_eq!(grant, TokenGrant::new("A2", "R2", 3600));
    }

    #[tokio::test]
    async fn missing_refresh_token_is_allowed() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2", "expires_in": 60})),
        )
        .await;

        let grant = api_for(&server).await.refresh("d", "R1").await.unwrap();

        assert_eq!(grant.refresh_token, None);
    }

    #[tokio::test]
    async fn unauthorized_and_not_found_are_invalid_credentials() {
        for status in [401, 404] {
            let server = MockServer::start().await;
            respond(&server, ResponseTemplate::new(status)).await;

            let err = api_for(&server).await.refresh("d", "R").await.unwrap_err();

            assert!(
                matches!(err, RefreshError::InvalidCredential { status: s } if s == status),
                "status {status} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let server = MockServer::start().await;
        respond(&server, ResponseTemplate::new(503).set_body_string("maintenance")).await;

        let err = api_for(&server).await.refresh("d", "R").await.unwrap_err();

        assert!(matches!(
            err,
            RefreshError::Status { status: 503, ref body } if body == "maintenance"
        ));
    }

    #[tokio::test]
    async fn zero_expiry_is_malformed() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "A", "expires_in": 0})),
        )
        .await;

        let err = api_for(&server).await.refresh("d", "R").await.unwrap_err();

        assert!(matches!(err, RefreshError::Malformed(_)));
    }

    #[tokio::test]
    async fn missing_access_token_is_malformed() {
        let server = MockServer::start().await;
        respond(&server, ResponseTemplate::new(200).set_body_json(json!({"expires_in": 60}))).await;

        let err = api_for(&server).await.refresh("d", "R").await.unwrap_err();

        assert!(matches!(err, RefreshError::Malformed(_)));
    }
}
