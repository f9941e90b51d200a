//! Testing utilities
//!
//! In-memory doubles for the traits the token manager and session queue are
//! built on:
//! - **[`mocks`]**: `MockKeychainProvider`, `MemoryStateStore`,
//!   `MockTokenRefresher`
//! - **[`time`]**: `MockClock`
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use distrack_common::testing::MockClock;
//! use distrack_common::time::Clock;
//!
//! let clock = MockClock::at_millis(1_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now_millis(), 6_000);
//! ```

pub mod mocks;
pub mod time;

pub use mocks::{MemoryStateStore, MockKeychainProvider, MockTokenRefresher};
pub use time::MockClock;
