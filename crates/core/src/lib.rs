//! # DisTrack Core
//!
//! Business logic for delivering coding sessions - no HTTP or platform code.
//!
//! This crate contains:
//! - The durable offline [`SessionQueue`]
//! - Port interfaces (traits) implemented by infrastructure
//!
//! ## Architecture Principles
//! - Depends only on `distrack-common` and `distrack-domain`
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

pub use sync::ports::SessionUploader;
pub use sync::{FlushReport, QueueError, SessionQueue, SessionQueueConfig, UploadError};
