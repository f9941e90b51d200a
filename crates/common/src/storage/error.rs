use distrack_domain::DisTrackError;
use thiserror::Error;

/// Result alias for state store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Plain state store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("state store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document or a value could not be (de)serialized
    #[error("state store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored document exists but is not a JSON object
    #[error("state store corrupted: {0}")]
    Corrupted(String),
}

impl From<StorageError> for DisTrackError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => Self::Serialization(e.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}
