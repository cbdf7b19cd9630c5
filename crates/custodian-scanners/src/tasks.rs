//! Per-scanner task entry points

use std::sync::Arc;

use custodian_core::models::{Scanner, ScannerConfig, TaskType};
use custodian_core::Config;

use crate::dispatcher::{ScanDispatcher, ScanOutcome};
use crate::error::ScanError;

/// Binds the dispatcher to the configured customs and wat endpoints.
#[derive(Clone)]
pub struct ScannerTasks {
    dispatcher: Arc<ScanDispatcher>,
    customs: ScannerConfig,
    wat: ScannerConfig,
}

impl ScannerTasks {
    pub fn new(dispatcher: Arc<ScanDispatcher>, config: &Config) -> Self {
        Self::with_scanners(
            dispatcher,
            config.scanner_config(Scanner::Customs),
            config.scanner_config(Scanner::Wat),
        )
    }

    pub fn with_scanners(
        dispatcher: Arc<ScanDispatcher>,
        customs: ScannerConfig,
        wat: ScannerConfig,
    ) -> Self {
        Self {
            dispatcher,
            customs,
            wat,
        }
    }

    /// Run the customs scanner on an upload.
    pub async fn run_customs(&self, upload_id: i64) -> Result<ScanOutcome, ScanError> {
        self.dispatcher.run_scanner(upload_id, &self.customs).await
    }

    /// Run the wat scanner on an upload.
    pub async fn run_wat(&self, upload_id: i64) -> Result<ScanOutcome, ScanError> {
        self.dispatcher.run_scanner(upload_id, &self.wat).await
    }

    pub async fn run_task(
        &self,
        task_type: TaskType,
        upload_id: i64,
    ) -> Result<ScanOutcome, ScanError> {
        match task_type {
            TaskType::RunCustoms => self.run_customs(upload_id).await,
            TaskType::RunWat => self.run_wat(upload_id).await,
        }
    }
}
