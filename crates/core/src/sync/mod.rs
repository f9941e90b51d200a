//! Offline session delivery
//!
//! Sessions are appended to a durable queue in the plain state store and
//! uploaded by [`SessionQueue::flush`], either on demand, after each enqueue,
//! or on a periodic timer.

pub mod errors;
pub mod ports;
pub mod queue;

pub use errors::{QueueError, UploadError};
pub use queue::{FlushReport, SessionQueue, SessionQueueConfig};
