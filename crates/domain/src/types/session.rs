//! Coding session types
//!
//! A [`SessionPayload`] is what the editor records when a coding session ends.
//! The queue wraps it in a [`QueuedSession`] carrying delivery bookkeeping.
//! Wire names follow the remote service (`sessionDate`, `streakData`, ...).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Streak counters reported alongside each session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// One completed coding session, as uploaded to `POST /v1/sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Client-generated idempotency id; assigned on enqueue when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Session length in seconds
    pub duration: f64,
    /// ISO-8601 date of the session
    #[serde(rename = "sessionDate")]
    pub session_date: String,
    /// Seconds spent per language
    #[serde(default)]
    pub languages: BTreeMap<String, f64>,
    #[serde(rename = "streakData", default)]
    pub streak_data: StreakData,
}

/// A session waiting in the offline queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedSession {
    pub session_id: Uuid,
    pub duration: f64,
    #[serde(rename = "sessionDate")]
    pub session_date: String,
    #[serde(default)]
    pub languages: BTreeMap<String, f64>,
    #[serde(rename = "streakData", default)]
    pub streak_data: StreakData,
    #[serde(rename = "queuedAt")]
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(rename = "lastError", default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedSession {
    /// Wrap a payload for queueing with the given id and zero attempts.
    #[must_use]
    pub fn new(session_id: Uuid, payload: SessionPayload, queued_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            duration: payload.duration,
            session_date: payload.session_date,
            languages: payload.languages,
            streak_data: payload.streak_data,
            queued_at,
            attempts: 0,
            last_error: None,
        }
    }

    /// The upload body: payload fields only, without queue bookkeeping.
    #[must_use]
    pub fn payload(&self) -> SessionPayload {
        SessionPayload {
            session_id: Some(self.session_id),
            duration: self.duration,
            session_date: self.session_date.clone(),
            languages: self.languages.clone(),
            streak_data: self.streak_data,
        }
    }

    /// Record a failed delivery attempt.
    pub fn record_failure(&mut self, error: String) {
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> SessionPayload {
        SessionPayload {
            session_id: None,
            duration: 1800.0,
            session_date: "2025-03-01T10:00:00Z".to_string(),
            languages: BTreeMap::from([("rust".to_string(), 1200.0), ("toml".to_string(), 600.0)]),
            streak_data: StreakData { current_streak: 3, longest_streak: 9 },
        }
    }

    #[test]
    fn payload_uses_service_field_names() {
        let id = Uuid::new_v4();
        let queued = QueuedSession::new(id, sample_payload(), Utc::now());
        let json = serde_json::to_value(queued.payload()).unwrap();

        assert_eq!(json["session_id"], id.to_string());
        assert_eq!(json["sessionDate"], "2025-03-01T10:00:00Z");
        assert_eq!(json["streakData"]["currentStreak"], 3);
        assert_eq!(json["streakData"]["longestStreak"], 9);
        assert!(json.get("attempts").is_none());
        assert!(json.get("queuedAt").is_none());
    }

    #[test]
    fn record_failure_increments_attempts() {
        let mut queued = QueuedSession::new(Uuid::new_v4(), sample_payload(), Utc::now());
        queued.record_failure("boom".to_string());
        queued.record_failure("again".to_string());

        assert_eq!(queued.attempts, 2);
        assert_eq!(queued.last_error.as_deref(), Some("again"));
    }

    #[test]
    fn stored_item_without_bookkeeping_defaults() {
        let json = serde_json::json!({
            "session_id": Uuid::new_v4(),
            "duration": 60.0,
            "sessionDate": "2025-03-01",
            "queuedAt": "2025-03-01T10:00:00Z"
        });
        let queued: QueuedSession = serde_json::from_value(json).unwrap();
        assert_eq!(queued.attempts, 0);
        assert!(queued.languages.is_empty());
        assert_eq!(queued.streak_data, StreakData::default());
    }
}
