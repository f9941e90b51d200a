//! # DisTrack Domain
//!
//! Plain data types shared by every DisTrack crate.
//!
//! This crate contains:
//! - Session payloads and the queued-session record
//! - Account/leaderboard response records
//! - Storage keys and tuning constants
//! - Configuration structures
//! - The domain error type and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other DisTrack crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
