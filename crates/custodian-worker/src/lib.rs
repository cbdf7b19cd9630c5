//! Custodian worker
//!
//! In-process task queue: tasks are submitted over a channel, run by a bounded
//! worker pool under a per-task timeout, and retried with capped exponential
//! backoff when the handler reports a recoverable error.

pub mod context;
pub mod queue;
pub mod store;

pub use context::TaskHandlerContext;
pub use queue::{TaskFinishedSender, TaskQueue, TaskQueueConfig, MAX_RETRY_BACKOFF_SECS};
pub use store::TaskStore;
