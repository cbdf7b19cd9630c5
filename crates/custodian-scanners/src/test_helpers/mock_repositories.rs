//! Mock repository implementations for testing

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use custodian_core::models::{NewScanResult, ScanResult, Scanner, Upload};
use custodian_db::{ScanResultRepository, UploadRepository};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::metrics::{outcome_key, ScanStatus, ScannerMetrics};

#[derive(Clone, Default)]
pub struct MockUploadRepository {
    uploads: Arc<Mutex<HashMap<i64, Upload>>>,
    fail: Arc<AtomicBool>,
}

impl MockUploadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_upload(&self, upload: Upload) {
        self.uploads.lock().unwrap().insert(upload.id, upload);
    }

    /// Make every subsequent lookup fail as if the database were unreachable.
    pub fn fail_lookups(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UploadRepository for MockUploadRepository {
    async fn get(&self, id: i64) -> Result<Option<Upload>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("connection pool timed out"));
        }
        Ok(self.uploads.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MockScanResultRepository {
    results: Arc<Mutex<Vec<ScanResult>>>,
    next_id: Arc<AtomicI64>,
    fail: Arc<AtomicBool>,
}

impl MockScanResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ScanResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn fail_inserts(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScanResultRepository for MockScanResultRepository {
    async fn create(&self, result: NewScanResult) -> Result<ScanResult> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("insert or update on table \"scanners_results\" violates foreign key constraint"));
        }
        let created = ScanResult {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            upload_id: result.upload_id,
            scanner: result.scanner,
            results: result.results,
            created_at: Utc::now(),
        };
        self.results.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

/// Metrics sink that keeps everything it is given
#[derive(Default)]
pub struct RecordingMetrics {
    counters: Mutex<HashMap<String, u64>>,
    timings: Mutex<Vec<(String, Duration)>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Number of timer samples recorded under `key`.
    pub fn timings(&self, key: &str) -> usize {
        self.timings
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.lock().unwrap().is_empty() && self.timings.lock().unwrap().is_empty()
    }
}

impl ScannerMetrics for RecordingMetrics {
    fn record_request_duration(&self, scanner: Scanner, elapsed: Duration) {
        self.timings
            .lock()
            .unwrap()
            .push((scanner.metric_key(), elapsed));
    }

    fn record_outcome(&self, scanner: Scanner, status: ScanStatus) {
        *self
            .counters
            .lock()
            .unwrap()
            .entry(outcome_key(scanner, status))
            .or_insert(0) += 1;
    }
}
