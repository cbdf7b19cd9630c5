//! Storage abstraction trait

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid download link: {0}")]
    InvalidSignature(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Read-side view of upload storage used by the scanners.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Generate a signed URL that grants temporary GET access to the file
    /// identified by `download_key`.
    async fn get_presigned_url(
        &self,
        download_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
