//! Account-level records returned by the remote service

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Profile of the linked account (`GET /v1/me`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserProfile {
    /// Name to show for the account, preferring the display name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// One row of `GET /v1/leaderboard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    /// Total coding time in seconds
    pub total_coding_time: f64,
}

/// Seconds per language (`GET /v1/me/languages`)
pub type LanguageDurations = BTreeMap<String, f64>;

/// Summary returned when a link code is verified (`POST /extension/link`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
