//! Port interfaces for session delivery

use async_trait::async_trait;
use distrack_domain::SessionPayload;

use super::errors::UploadError;

/// Trait for submitting one session to the remote service
#[async_trait]
pub trait SessionUploader: Send + Sync {
    /// Upload a single session; `session_id` is the idempotency key
    async fn upload(&self, session: &SessionPayload) -> Result<(), UploadError>;
}
