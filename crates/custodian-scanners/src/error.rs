use custodian_core::TaskError;
use custodian_storage::StorageError;
use thiserror::Error;

/// Errors that escape the dispatcher. Both concern the upload lookup, which
/// happens before the failure-containment region.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Upload {0} not found")]
    UploadNotFound(i64),

    #[error("Failed to look up upload {upload_id}")]
    Lookup {
        upload_id: i64,
        #[source]
        source: anyhow::Error,
    },
}

impl ScanError {
    /// Classify for the task runner: a missing upload will not appear on retry,
    /// a failed lookup might.
    pub fn into_task_error(self) -> TaskError {
        match self {
            ScanError::UploadNotFound(_) => TaskError::unrecoverable(self),
            ScanError::Lookup { .. } => TaskError::recoverable(self),
        }
    }
}

/// Failures inside a scan. Logged, counted and suppressed by the dispatcher.
#[derive(Debug, Error)]
pub enum ScanFailure {
    #[error("File \"{0}\" does not exist.")]
    MissingFile(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Scanner request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The body could not be decoded as JSON; holds the raw body text.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("Scanner reported an error: {0}")]
    ScannerError(serde_json::Value),

    /// Valid JSON that cannot hold a verdict (`null`, a number or a boolean).
    #[error("Scanner returned an unexpected payload: {0}")]
    UnexpectedPayload(serde_json::Value),

    #[error("Failed to store scanner result: {0:#}")]
    Persist(anyhow::Error),
}
