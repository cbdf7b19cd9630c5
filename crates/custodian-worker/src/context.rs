//! Handler seam between the queue and the application.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use custodian_core::models::Task;

/// Runs tasks on behalf of the queue.
///
/// The queue keeps only a `Weak` to it; once the owner drops the context,
/// remaining tasks fail instead of keeping application state alive.
#[async_trait]
pub trait TaskHandlerContext: Send + Sync {
    /// Returns a JSON summary stored as the task result. Errors wrapped in an
    /// unrecoverable [`custodian_core::TaskError`] fail the task at once.
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value>;
}
