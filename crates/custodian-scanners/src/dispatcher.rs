//! Scan dispatcher
//!
//! One scan is a lookup, a file-type check, and a contained region that posts
//! the upload's download link to the scanner and stores the verdict. Anything
//! that goes wrong inside the region is logged and counted as a failure; it is
//! never returned as an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use custodian_core::models::{NewScanResult, ScanResult, ScannerConfig, Upload};
use custodian_db::{ScanResultRepository, UploadRepository};
use custodian_storage::Storage;

use crate::client::{parse_response, ScanRequest, ScannerClient};
use crate::error::{ScanError, ScanFailure};
use crate::metrics::{ScanStatus, ScannerMetrics};

/// Timeouts applied to every scan
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Upper bound on the scanner HTTP call
    pub request_timeout: Duration,
    /// Lifetime of the signed download link sent to the scanner
    pub download_url_ttl: Duration,
}

/// What happened to one dispatched scan.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The upload is not a scannable archive; nothing was sent.
    Skipped,
    Stored(ScanResult),
    /// The scan failed; the failure has already been logged and counted.
    Failed(ScanFailure),
}

impl ScanOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, ScanOutcome::Stored(_))
    }
}

pub struct ScanDispatcher {
    uploads: Arc<dyn UploadRepository>,
    results: Arc<dyn ScanResultRepository>,
    storage: Arc<dyn Storage>,
    client: ScannerClient,
    metrics: Arc<dyn ScannerMetrics>,
    settings: DispatchSettings,
}

impl ScanDispatcher {
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        results: Arc<dyn ScanResultRepository>,
        storage: Arc<dyn Storage>,
        client: ScannerClient,
        metrics: Arc<dyn ScannerMetrics>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            uploads,
            results,
            storage,
            client,
            metrics,
            settings,
        }
    }

    /// Run one scanner against one upload and store its verdict.
    ///
    /// Returns `Err` only when the upload cannot be resolved. Every other
    /// problem ends up as [`ScanOutcome::Failed`] after being logged and
    /// counted.
    #[tracing::instrument(skip(self, scanner_config), fields(scanner = %scanner_config.scanner))]
    pub async fn run_scanner(
        &self,
        upload_id: i64,
        scanner_config: &ScannerConfig,
    ) -> Result<ScanOutcome, ScanError> {
        let scanner = scanner_config.scanner;
        tracing::info!(
            scanner = %scanner,
            upload_id = upload_id,
            "Starting scanner task"
        );

        let upload = self
            .uploads
            .get(upload_id)
            .await
            .map_err(|source| ScanError::Lookup { upload_id, source })?
            .ok_or(ScanError::UploadNotFound(upload_id))?;

        if !upload.is_scannable() {
            tracing::info!(
                scanner = %scanner,
                upload_id = upload_id,
                path = %upload.path,
                "Not running scanner, upload is not an xpi file"
            );
            return Ok(ScanOutcome::Skipped);
        }

        match self.scan_upload(&upload, scanner_config).await {
            Ok(result) => {
                self.metrics.record_outcome(scanner, ScanStatus::Success);
                tracing::info!(
                    scanner = %scanner,
                    upload_id = upload_id,
                    scan_result_id = result.id,
                    "Ending scanner task"
                );
                Ok(ScanOutcome::Stored(result))
            }
            Err(failure) => {
                self.metrics.record_outcome(scanner, ScanStatus::Failure);
                tracing::error!(
                    scanner = %scanner,
                    upload_id = upload_id,
                    error = %failure,
                    details = ?failure,
                    "Error in scanner task"
                );
                Ok(ScanOutcome::Failed(failure))
            }
        }
    }

    async fn scan_upload(
        &self,
        upload: &Upload,
        scanner_config: &ScannerConfig,
    ) -> Result<ScanResult, ScanFailure> {
        if !self.storage.exists(&upload.path).await? {
            return Err(ScanFailure::MissingFile(upload.path.clone()));
        }

        let started = Instant::now();
        let response = self.request_scan(upload, scanner_config).await;
        self.metrics
            .record_request_duration(scanner_config.scanner, started.elapsed());

        let body = response?;
        let results = parse_response(&body)?;

        self.results
            .create(NewScanResult {
                upload_id: upload.id,
                scanner: scanner_config.scanner,
                results,
            })
            .await
            .map_err(ScanFailure::Persist)
    }

    async fn request_scan(
        &self,
        upload: &Upload,
        scanner_config: &ScannerConfig,
    ) -> Result<String, ScanFailure> {
        let download_url = self
            .storage
            .get_presigned_url(&upload.download_key(), self.settings.download_url_ttl)
            .await?;

        let request = ScanRequest {
            api_key: &scanner_config.api_key,
            download_url: &download_url,
        };

        self.client
            .post(
                &scanner_config.api_url,
                &request,
                self.settings.request_timeout,
            )
            .await
    }
}
