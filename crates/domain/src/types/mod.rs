//! Domain types and models

pub mod account;
pub mod session;

pub use account::{LanguageDurations, LeaderboardEntry, LinkedUser, UserProfile};
pub use session::{QueuedSession, SessionPayload, StreakData};
