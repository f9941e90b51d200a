//! Base URL resolution for the remote service
//!
//! Sources are tried in order: an explicitly configured URL, the
//! `DISTRACK_API_BASE_URL` environment variable, then the contents of the
//! configured link file. The first hit is normalised and cached for the
//! lifetime of the resolver.

use std::path::PathBuf;

use distrack_domain::ApiConfig;
use tokio::sync::OnceCell;
use tracing::debug;

use super::errors::ApiError;

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "DISTRACK_API_BASE_URL";

#[derive(Debug, Default)]
pub struct BaseUrlResolver {
    explicit: Option<String>,
    link_file: Option<PathBuf>,
    resolved: OnceCell<String>,
}

impl BaseUrlResolver {
    pub fn new(explicit: Option<String>, link_file: Option<PathBuf>) -> Self {
        Self { explicit, link_file, resolved: OnceCell::new() }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.clone(), config.link_file.clone())
    }

    /// Resolver that always yields `url`
    pub fn fixed(url: impl Into<String>) -> Self {
        Self::new(Some(url.into()), None)
    }

    /// The base URL without a trailing slash
    ///
    /// # Errors
    /// `ApiError::Config` when no source yields a non-empty URL
    pub async fn resolve(&self) -> Result<&str, ApiError> {
        self.resolved.get_or_try_init(|| self.lookup()).await.map(String::as_str)
    }

    /// Join `path` (starting with `/`) onto the base URL
    pub async fn url_for(&self, path: &str) -> Result<String, ApiError> {
        Ok(format!("{}{path}", self.resolve().await?))
    }

    async fn lookup(&self) -> Result<String, ApiError> {
        if let Some(url) = self.explicit.as_deref().and_then(normalize) {
            debug!(source = "config", "resolved API base URL");
            return Ok(url);
        }

        if let Some(url) = std::env::var(BASE_URL_ENV).ok().as_deref().and_then(normalize) {
            debug!(source = "env", "resolved API base URL");
            return Ok(url);
        }

        if let Some(path) = &self.link_file {
            let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                ApiError::Config(format!("failed to read link file {}: {e}", path.display()))
            })?;
            return normalize(&raw)
                .inspect(|_| debug!(source = "link_file", "resolved API base URL"))
                .ok_or_else(|| ApiError::Config(format!("link file {} is empty", path.display())));
        }

        Err(ApiError::Config("no API base URL configured".to_string()))
    }
}

/// Trim whitespace and one trailing `/`; empty input yields `None`.
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
