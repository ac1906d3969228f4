//! Durable JSON record storage backed by a remote file API.
//!
//! Writes are optimistic: `update` only succeeds when the caller presents the
//! content hash it read, so two concurrent writers can never both win.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConfigError;

pub mod github;

pub use github::GitHubStore;

/// A file's decoded content together with its concurrency token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{path} not found")]
    NotFound { path: String },

    #[error("{path} was changed by someone else; reload and retry")]
    Conflict { path: String },

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("stored content is not valid: {0}")]
    Malformed(String),

    #[error("file store request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Creates or overwrites `path`.
    async fn put(&self, path: &str, content: &str, message: &str) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<StoredFile, StoreError>;

    /// Overwrites `path` only if its current hash still equals `sha`.
    async fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<(), StoreError>;
}
