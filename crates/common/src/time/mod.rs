//! Time abstraction for expiry arithmetic
//!
//! Credential expiry is stored as epoch milliseconds, so the clock exposes
//! wall-clock time in that unit. Production code uses [`SystemClock`];
//! tests drive a `MockClock` from [`crate::testing`].

mod clock;

pub use clock::{Clock, SystemClock};
