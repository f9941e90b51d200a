//! Application constants
//!
//! Storage keys, endpoint paths and tuning values used across the workspace.

// Secure store entries
pub const ACCESS_TOKEN_KEY: &str = "distrack.access_token";
pub const REFRESH_TOKEN_KEY: &str = "distrack.refresh_token";

// Plain store entries
pub const ACCESS_EXPIRES_KEY: &str = "distrack.access_token_expires_at";
pub const DEVICE_ID_KEY: &str = "distrack.device_id";
pub const SESSION_QUEUE_KEY: &str = "distrack.session_queue";

/// An access token is only handed out while it has more than this much life left.
pub const ACCESS_TOKEN_EXPIRY_BUFFER_MS: i64 = 60_000;

// Session queue
pub const MAX_QUEUE_ITEMS: usize = 500;
pub const FLUSH_INTERVAL_SECS: u64 = 60;
pub const MAX_LAST_ERROR_LEN: usize = 256;

// Linking
pub const DEFAULT_LINK_POLL_INTERVAL_SECS: u64 = 5;

// HTTP
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "DisTrack";

// Remote endpoints
pub const REFRESH_PATH: &str = "/v1/auth/refresh";
pub const LINK_START_PATH: &str = "/v1/link/start";
pub const LINK_FINISH_PATH: &str = "/v1/link/finish";
pub const EXTENSION_LINK_PATH: &str = "/extension/link";
pub const SESSIONS_PATH: &str = "/v1/sessions";
pub const ME_PATH: &str = "/v1/me";
pub const ME_STREAK_PATH: &str = "/v1/me/streak";
pub const ME_LANGUAGES_PATH: &str = "/v1/me/languages";
pub const LEADERBOARD_PATH: &str = "/v1/leaderboard";
