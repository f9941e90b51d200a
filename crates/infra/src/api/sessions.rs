//! Session upload endpoint
//!
//! Adapts [`ApiClient`] to the core [`SessionUploader`] port used by the
//! offline queue.

use std::sync::Arc;

use async_trait::async_trait;
use distrack_core::{SessionUploader, UploadError};
use distrack_domain::constants::SESSIONS_PATH;
use distrack_domain::SessionPayload;
use reqwest::Method;
use tracing::{debug, instrument};

use super::client::{ApiClient, RequestOptions};
use super::errors::ApiError;

pub struct SessionsApi {
    client: Arc<ApiClient>,
}

impl SessionsApi {
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionUploader for SessionsApi {
    #[instrument(skip_all, fields(session_id = ?session.session_id))]
    async fn upload(&self, session: &SessionPayload) -> Result<(), UploadError> {
        let options = RequestOptions::new().json(session).map_err(to_upload_error)?;
        self.client.request(Method::POST, SESSIONS_PATH, options).await.map_err(to_upload_error)?;
        debug!("session uploaded");
        Ok(())
    }
}

fn to_upload_error(err: ApiError) -> UploadError {
    match err {
        ApiError::NotLinked | ApiError::NotInitialized => UploadError::NotLinked,
        other => match other.status() {
            Some(status) => UploadError::Rejected { status, message: other.to_string() },
            None => UploadError::Transport(other.to_string()),
        },
    }
}
