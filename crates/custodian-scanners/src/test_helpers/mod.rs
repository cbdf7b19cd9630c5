//! Test helpers for dispatcher unit tests
//!
//! In-memory repositories, storage and metrics so scans can run against a
//! mock scanner without a database.

pub mod fixtures;
pub mod mock_repositories;
pub mod mock_storage;

pub use fixtures::*;
pub use mock_repositories::*;
pub use mock_storage::*;

use std::sync::Arc;
use std::time::Duration;

use custodian_core::models::Upload;

use crate::client::ScannerClient;
use crate::dispatcher::{DispatchSettings, ScanDispatcher};

/// Mocks wired into a dispatcher. Keeps handles for assertions.
pub struct TestHarness {
    pub uploads: Arc<MockUploadRepository>,
    pub results: Arc<MockScanResultRepository>,
    pub storage: Arc<MockStorage>,
    pub metrics: Arc<RecordingMetrics>,
    pub settings: DispatchSettings,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_request_timeout(Duration::from_secs(5))
    }

    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            uploads: Arc::new(MockUploadRepository::new()),
            results: Arc::new(MockScanResultRepository::new()),
            storage: Arc::new(MockStorage::new()),
            metrics: Arc::new(RecordingMetrics::new()),
            settings: DispatchSettings {
                request_timeout,
                download_url_ttl: Duration::from_secs(3600),
            },
        }
    }

    /// Register an upload; `stored` controls whether its file is in storage.
    pub fn add_upload(&self, id: i64, path: &str, stored: bool) -> Upload {
        let upload = create_test_upload(id, path);
        self.uploads.add_upload(upload.clone());
        if stored {
            self.storage.set_file(path);
        }
        upload
    }

    pub fn dispatcher(&self) -> ScanDispatcher {
        ScanDispatcher::new(
            self.uploads.clone(),
            self.results.clone(),
            self.storage.clone(),
            ScannerClient::with_client(reqwest::Client::new()),
            self.metrics.clone(),
            self.settings,
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
