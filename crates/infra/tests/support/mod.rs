//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use distrack_common::auth::TokenGrant;
use distrack_common::testing::{MemoryStateStore, MockClock, MockKeychainProvider};
use distrack_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_PATH, REFRESH_TOKEN_KEY};
use distrack_domain::{ApiConfig, Config, SessionPayload, StreakData};
use distrack_infra::DisTrackServices;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 2025-03-01T10:00:00Z
pub const NOW_MS: i64 = 1_740_823_200_000;

/// Services wired against a mock server and in-memory stores.
pub struct Stack {
    pub server: MockServer,
    pub services: DisTrackServices,
    pub keychain: MockKeychainProvider,
    pub state: MemoryStateStore,
    pub clock: MockClock,
}

impl Stack {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let keychain = MockKeychainProvider::default();
        let state = MemoryStateStore::new();
        let clock = MockClock::at_millis(NOW_MS);

        let config = Config {
            api: ApiConfig { base_url: Some(server.uri()), ..ApiConfig::default() },
            ..Config::default()
        };
        let services = DisTrackServices::with_stores(
            &config,
            Arc::new(keychain.clone()),
            Arc::new(state.clone()),
            Arc::new(clock.clone()),
        )
        .expect("services should build");
        services.tokens.initialize().await.expect("token manager should initialize");

        Self { server, services, keychain, state, clock }
    }

    /// Store credentials as if linking had just completed.
    pub async fn link(&self, access: &str, refresh: &str, expires_in: i64) {
        self.services
            .tokens
            .store_tokens(TokenGrant::new(access, refresh, expires_in))
            .await
            .expect("tokens should be stored");
    }

    pub fn access_token(&self) -> Option<String> {
        self.keychain.secret(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.keychain.secret(REFRESH_TOKEN_KEY)
    }

    /// Answer refresh calls with a fresh grant; `expect` calls exactly.
    pub async fn mount_refresh(&self, access: &str, refresh: &str, expect: u64) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": refresh,
                "expires_in": 3600
            })))
            .expect(expect)
            .mount(&self.server)
            .await;
    }
}

pub fn session(minutes: u32) -> SessionPayload {
    SessionPayload {
        session_id: None,
        duration: f64::from(minutes * 60),
        session_date: "2025-03-01".to_string(),
        languages: BTreeMap::from([("rust".to_string(), f64::from(minutes * 60))]),
        streak_data: StreakData { current_streak: 3, longest_streak: 9 },
    }
}
