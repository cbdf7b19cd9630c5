//! Retry classification for task handlers
//!
//! The worker downcasts handler errors to [`TaskError`] to decide whether a
//! failed task is worth another attempt. Errors of any other type are retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Retrying cannot help, e.g. the upload the task names does not exist.
    #[error(transparent)]
    Unrecoverable(anyhow::Error),

    /// The failure may clear up on its own, e.g. a database timeout.
    #[error(transparent)]
    Recoverable(anyhow::Error),
}

impl TaskError {
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        TaskError::Unrecoverable(err.into())
    }

    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        TaskError::Recoverable(err.into())
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, TaskError::Recoverable(_))
    }
}

/// Marks the error side of a `Result` as not worth retrying.
pub trait TaskResultExt<T> {
    fn unrecoverable(self) -> Result<T, TaskError>;
}

impl<T, E: Into<anyhow::Error>> TaskResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, TaskError> {
        self.map_err(TaskError::unrecoverable)
    }
}
