//! Read-only account endpoints

use std::sync::Arc;

use distrack_domain::constants::{LEADERBOARD_PATH, ME_LANGUAGES_PATH, ME_PATH, ME_STREAK_PATH};
use distrack_domain::{LanguageDurations, LeaderboardEntry, StreakData, UserProfile};
use tracing::instrument;

use super::client::ApiClient;
use super::errors::ApiError;

pub struct AccountApi {
    client: Arc<ApiClient>,
}

impl AccountApi {
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `GET /v1/me`
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.client.get_json(ME_PATH).await
    }

    /// `GET /v1/me/streak`
    #[instrument(skip(self))]
    pub async fn streak(&self) -> Result<StreakData, ApiError> {
        self.client.get_json(ME_STREAK_PATH).await
    }

    /// `GET /v1/me/languages`
    #[instrument(skip(self))]
    pub async fn languages(&self) -> Result<LanguageDurations, ApiError> {
        self.client.get_json(ME_LANGUAGES_PATH).await
    }

    /// `GET /v1/leaderboard`
    #[instrument(skip(self))]
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.client.get_json(LEADERBOARD_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use distrack_common::auth::{AccessTokenProvider, TokenManagerError};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::BaseUrlResolver;

    struct StaticToken;

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn auth_header(&self) -> Result<String, TokenManagerError> {
            Ok("Bearer T".to_string())
        }

        async fn refresh(&self) -> Result<(), TokenManagerError> {
            Ok(())
        }
    }

    fn account_api(server: &MockServer) -> AccountApi {
        let client = ApiClient::builder()
            .base_url(Arc::new(BaseUrlResolver::fixed(server.uri())))
            .auth(Arc::new(StaticToken))
            .build()
            .unwrap();
        AccountApi::new(Arc::new(client))
    }

    /// Validates the typed account endpoints scenario.
    ///
    /// Assertions:
    /// - Each call hits its path with the bearer header.
    /// - camelCase bodies decode into the domain records.
    #[tokio::test]
    async fn account_endpoints_decode_typed_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ME_STREAK_PATH))
            .and(header("authorization", "Bearer T"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"currentStreak": 4, "longestStreak": 9})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ME_LANGUAGES_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rust": 5400.0, "toml": 60.5})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(LEADERBOARD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"userId": "u1", "username": "ada", "totalCodingTime": 7200.0},
                {"userId": "u2", "username": "linus", "totalCodingTime": 3600.0}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let api = account_api(&server);

        let streak = api.streak().await.unwrap();
        assert_eq!(streak, StreakData { current_streak: 4, longest_streak: 9 });

        let languages = api.languages().await.unwrap();
        assert_eq!(languages.get("rust"), Some(&5400.0));
        assert_eq!(languages.len(), 2);

        let board = api.leaderboard().await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, "ada");
    }

    #[tokio::test]
    async fn profile_missing_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ME_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userId": "u1"})))
            .mount(&server)
            .await;

        let result = account_api(&server).profile().await;

        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }
}
