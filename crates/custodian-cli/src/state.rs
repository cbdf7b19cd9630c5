//! Application state handed to the task queue

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use custodian_core::models::{Scanner, Task};
use custodian_core::TaskResultExt;
use custodian_scanners::{ScanError, ScanOutcome, ScannerTasks};
use custodian_worker::TaskHandlerContext;

pub struct AppState {
    pub scanners: ScannerTasks,
}

impl AppState {
    pub fn new(scanners: ScannerTasks) -> Self {
        Self { scanners }
    }
}

#[async_trait]
impl TaskHandlerContext for AppState {
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<Value> {
        // A malformed payload will be just as malformed on the next attempt.
        let upload_id = task.upload_id().unrecoverable()?;

        let outcome = self
            .scanners
            .run_task(task.task_type, upload_id)
            .await
            .map_err(ScanError::into_task_error)?;

        Ok(outcome_summary(upload_id, task.task_type.scanner(), &outcome))
    }
}

/// JSON summary of a dispatched scan, stored as the task result.
pub fn outcome_summary(upload_id: i64, scanner: Scanner, outcome: &ScanOutcome) -> Value {
    match outcome {
        ScanOutcome::Skipped => json!({
            "upload_id": upload_id,
            "scanner": scanner.name(),
            "outcome": "skipped",
        }),
        ScanOutcome::Stored(result) => json!({
            "upload_id": upload_id,
            "scanner": scanner.name(),
            "outcome": "stored",
            "scan_result_id": result.id,
        }),
        ScanOutcome::Failed(failure) => json!({
            "upload_id": upload_id,
            "scanner": scanner.name(),
            "outcome": "failed",
            "error": failure.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodian_core::models::{ScannerConfig, TaskType};
    use custodian_core::TaskError;
    use custodian_db::{PgScanResultRepository, PgUploadRepository};
    use custodian_scanners::{
        DispatchSettings, ScanDispatcher, ScanFailure, ScannerClient, TracingMetrics,
    };
    use custodian_storage::{LocalStorage, UrlSigner};
    use std::time::Duration;

    async fn lazy_state(root: &std::path::Path) -> Arc<AppState> {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/custodian_test").unwrap();
        let storage = LocalStorage::new(
            root.to_path_buf(),
            "http://localhost:3000".to_string(),
            UrlSigner::new([7u8; 32]).unwrap(),
        )
        .await
        .unwrap();
        let dispatcher = ScanDispatcher::new(
            Arc::new(PgUploadRepository::new(pool.clone())),
            Arc::new(PgScanResultRepository::new(pool)),
            Arc::new(storage),
            ScannerClient::new().unwrap(),
            Arc::new(TracingMetrics),
            DispatchSettings {
                request_timeout: Duration::from_secs(1),
                download_url_ttl: Duration::from_secs(60),
            },
        );
        let config = |scanner| ScannerConfig {
            scanner,
            api_url: "http://127.0.0.1:9/".to_string(),
            api_key: "key".to_string(),
        };
        Arc::new(AppState::new(ScannerTasks::with_scanners(
            Arc::new(dispatcher),
            config(Scanner::Customs),
            config(Scanner::Wat),
        )))
    }

    #[tokio::test]
    async fn malformed_payload_is_unrecoverable() {
        let root = tempfile::tempdir().unwrap();
        let state = lazy_state(root.path()).await;
        let task = Task::new(TaskType::RunCustoms, json!({ "id": "abc" }), 3, None);

        let err = state.dispatch_task(&task).await.unwrap_err();

        let task_error = err.downcast_ref::<TaskError>().unwrap();
        assert!(!task_error.is_recoverable());
        assert!(err.to_string().contains("run_customs"));
    }

    #[test]
    fn summary_reports_failure_message() {
        let outcome = ScanOutcome::Failed(ScanFailure::MissingFile("uploads/a.xpi".to_string()));
        let summary = outcome_summary(4, Scanner::Wat, &outcome);
        assert_eq!(summary["outcome"], json!("failed"));
        assert_eq!(summary["scanner"], json!("wat"));
        assert_eq!(
            summary["error"],
            json!("File \"uploads/a.xpi\" does not exist.")
        );
    }

    #[test]
    fn summary_for_skipped_upload() {
        let summary = outcome_summary(9, Scanner::Customs, &ScanOutcome::Skipped);
        assert_eq!(summary["outcome"], json!("skipped"));
        assert_eq!(summary["upload_id"], json!(9));
    }
}
