use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::signing::UrlSigner;
use crate::traits::{Storage, StorageError, StorageResult};

/// Local filesystem storage with signed download links
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signer: UrlSigner,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory uploads are stored under
    /// * `base_url` - Public origin that serves `/uploads/file/<key>` (e.g. "https://uploads.example")
    /// * `signer` - Signs download links handed out to scanners
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signer: UrlSigner,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signer,
        })
    }

    /// Convert storage key to filesystem path, refusing keys that escape the root
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        // Symlinks inside the root could still point outside of it.
        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn download_url(&self, download_key: &str, expires: i64, signature: &str) -> String {
        format!(
            "{}/uploads/file/{}?expires={}&signature={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(download_key),
            expires,
            signature
        )
    }

    /// Validate the query parameters of a link produced by `get_presigned_url`.
    pub fn verify_presigned_url(
        &self,
        download_key: &str,
        expires: i64,
        signature: &str,
    ) -> StorageResult<()> {
        self.signer
            .verify(download_key, expires, signature, Utc::now().timestamp())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        // Only NotFound means absent; other I/O errors are reported as such.
        Ok(fs::try_exists(&path).await?)
    }

    async fn get_presigned_url(
        &self,
        download_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if download_key.is_empty() {
            return Err(StorageError::InvalidKey("Empty download key".to_string()));
        }
        let ttl = i64::try_from(expires_in.as_secs())
            .map_err(|_| StorageError::ConfigError("Download link TTL too large".to_string()))?;
        let expires = Utc::now().timestamp().saturating_add(ttl);
        let signature = self.signer.sign(download_key, expires);

        tracing::debug!(
            download_key = %download_key,
            expires = expires,
            "Signed upload download link"
        );

        Ok(self.download_url(download_key, expires, &signature))
    }
}
