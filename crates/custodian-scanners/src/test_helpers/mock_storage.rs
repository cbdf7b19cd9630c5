//! Mock Storage implementation for testing

use async_trait::async_trait;
use custodian_storage::{Storage, StorageError, StorageResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tracks which keys exist and hands out predictable download links.
#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashSet<String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&self, key: &str) {
        self.files.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.files.lock().unwrap().contains(storage_key))
    }

    async fn get_presigned_url(
        &self,
        download_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if download_key.is_empty() {
            return Err(StorageError::InvalidKey(download_key.to_string()));
        }
        Ok(format!(
            "https://uploads.test/uploads/file/{}?expires={}&signature=test",
            download_key,
            expires_in.as_secs()
        ))
    }
}
