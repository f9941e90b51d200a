use distrack_common::storage::StorageError;
use thiserror::Error;

/// Session queue errors
///
/// Upload failures never surface here; they are recorded on the item.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("queue serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure to deliver one session
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// No credentials; the device must be linked first
    #[error("device is not linked")]
    NotLinked,

    /// The service answered with a non-success status
    #[error("upload rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network, timeout or other transport failure
    #[error("upload failed: {0}")]
    Transport(String),
}
