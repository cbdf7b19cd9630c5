//! Task queue: worker pool, per-task timeout, retry, and submission.
//!
//! Shutdown: [`TaskQueue::shutdown`] signals the pool to stop taking tasks off
//! the channel; it does not wait for in-flight tasks.

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use custodian_core::models::{Task, TaskStatus, TaskType};
use custodian_core::{Config, TaskError};

use crate::context::TaskHandlerContext;
use crate::store::TaskStore;

/// Maximum delay, in backoff units, before retrying a failed task.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

const QUEUE_CAPACITY: usize = 1024;

/// Computes backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    2_u64
        .checked_pow(retry_count.max(0) as u32)
        .unwrap_or(u64::MAX)
        .min(MAX_RETRY_BACKOFF_SECS)
}

/// Receives `(task_id, status)` each time a task reaches a terminal state.
pub type TaskFinishedSender = mpsc::Sender<(Uuid, TaskStatus)>;

#[derive(Clone, Debug)]
pub struct TaskQueueConfig {
    pub max_workers: usize,
    pub default_timeout_seconds: i32,
    pub max_retries: i32,
    /// Length of one backoff step. Retry `n` waits `min(2^n, 300)` steps.
    pub retry_backoff_unit: Duration,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            default_timeout_seconds: 300,
            max_retries: 3,
            retry_backoff_unit: Duration::from_secs(1),
        }
    }
}

impl From<&Config> for TaskQueueConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_workers: config.task_queue_max_workers,
            default_timeout_seconds: config.task_queue_default_timeout_seconds,
            max_retries: config.task_queue_max_retries,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct TaskQueue {
    store: TaskStore,
    config: TaskQueueConfig,
    task_tx: mpsc::Sender<Task>,
    shutdown_tx: mpsc::Sender<()>,
}

impl TaskQueue {
    /// Create the queue and spawn its worker pool on the current runtime.
    pub fn new(
        config: TaskQueueConfig,
        context: Weak<dyn TaskHandlerContext>,
        task_finished_tx: Option<TaskFinishedSender>,
    ) -> Self {
        let (task_tx, task_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let store = TaskStore::new();

        tokio::spawn(Self::worker_pool(
            WorkerShared {
                store: store.clone(),
                config: config.clone(),
                context,
                task_tx: task_tx.clone(),
                task_finished_tx,
            },
            task_rx,
            shutdown_rx,
        ));

        Self {
            store,
            config,
            task_tx,
            shutdown_tx,
        }
    }

    /// Submit a new task to the queue.
    #[tracing::instrument(skip(self, payload))]
    pub async fn submit_task(
        &self,
        task_type: TaskType,
        payload: serde_json::Value,
    ) -> Result<Uuid> {
        let task = Task::new(
            task_type,
            payload,
            self.config.max_retries,
            Some(self.config.default_timeout_seconds),
        );
        let task_id = task.id;

        self.store.insert(task.clone()).await;
        self.task_tx.send(task).await.map_err(|_| {
            tracing::error!(task_id = %task_id, task_type = %task_type, "Task queue is closed");
            anyhow!("Task queue is closed, cannot submit {}", task_type)
        })?;

        tracing::info!(
            task_id = %task_id,
            task_type = %task_type,
            "Task submitted to queue"
        );

        Ok(task_id)
    }

    /// Latest state of a submitted task.
    pub async fn get_task(&self, task_id: Uuid) -> Option<Task> {
        self.store.get(task_id).await
    }

    async fn worker_pool(
        shared: WorkerShared,
        mut task_rx: mpsc::Receiver<Task>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(
            max_workers = shared.config.max_workers,
            max_retries = shared.config.max_retries,
            "Task queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(shared.config.max_workers));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Task queue worker pool shutting down");
                    break;
                }
                next = task_rx.recv() => {
                    let Some(task) = next else { break };
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let shared = shared.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let task_id = task.id;
                        if let Err(e) = Self::process_task_with_retry(task, shared).await {
                            tracing::error!(task_id = %task_id, error = %e, "Task processing failed");
                        }
                    });
                }
            }
        }

        tracing::info!("Task queue worker pool stopped");
    }

    #[tracing::instrument(skip(shared), fields(task.id = %task.id, task.type = %task.task_type))]
    async fn process_task_with_retry(task: Task, shared: WorkerShared) -> Result<()> {
        let Some(ctx) = shared.context.upgrade() else {
            shared
                .fail(&task, json!({ "error": "Task handler context is gone" }))
                .await?;
            return Err(anyhow!(
                "TaskHandlerContext was dropped, cannot process task"
            ));
        };

        shared
            .store
            .update_status(task.id, TaskStatus::Running)
            .await?;

        let timeout_duration = task
            .timeout_seconds
            .map(|s| Duration::from_secs(s.max(0) as u64))
            .unwrap_or(Duration::from_secs(
                shared.config.default_timeout_seconds.max(0) as u64,
            ));

        let result = tokio::time::timeout(timeout_duration, ctx.dispatch_task(&task)).await;

        match result {
            Ok(Ok(task_result)) => {
                shared
                    .store
                    .mark_completed(task.id, task_result)
                    .await
                    .context("Failed to mark task as completed")?;
                shared.notify(task.id, TaskStatus::Completed).await;
                tracing::info!(task_id = %task.id, task_type = %task.task_type, "Task completed successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                let is_unrecoverable = e
                    .downcast_ref::<TaskError>()
                    .map(|te| !te.is_recoverable())
                    .unwrap_or(false);

                tracing::error!(
                    task_id = %task.id,
                    error = %e,
                    retry_count = task.retry_count,
                    max_retries = task.max_retries,
                    unrecoverable = is_unrecoverable,
                    "Task execution failed"
                );

                if is_unrecoverable {
                    shared
                        .fail(
                            &task,
                            json!({
                                "error": e.to_string(),
                                "retry_count": task.retry_count,
                                "unrecoverable": true,
                            }),
                        )
                        .await?;
                    Err(e)
                } else if task.can_retry() {
                    shared.schedule_retry(&task).await
                } else {
                    shared
                        .fail(
                            &task,
                            json!({
                                "error": e.to_string(),
                                "retry_count": task.retry_count,
                                "reason": "Task failed after maximum retries",
                            }),
                        )
                        .await?;
                    tracing::error!(task_id = %task.id, "Task failed after max retries");
                    Err(e)
                }
            }
            Err(_) => {
                tracing::error!(
                    task_id = %task.id,
                    timeout_seconds = ?task.timeout_seconds,
                    "Task execution timed out"
                );
                if task.can_retry() {
                    shared.schedule_retry(&task).await
                } else {
                    shared
                        .fail(
                            &task,
                            json!({
                                "error": "Task execution timed out",
                                "timeout_seconds": task.timeout_seconds,
                            }),
                        )
                        .await?;
                    Err(anyhow!("Task execution timed out"))
                }
            }
        }
    }

    /// Signals the worker pool to stop taking new tasks.
    ///
    /// Returns immediately; in-flight tasks keep running until they finish or
    /// time out. Retries scheduled after this point are dropped.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating task queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// State handed to every spawned task.
#[derive(Clone)]
struct WorkerShared {
    store: TaskStore,
    config: TaskQueueConfig,
    context: Weak<dyn TaskHandlerContext>,
    task_tx: mpsc::Sender<Task>,
    task_finished_tx: Option<TaskFinishedSender>,
}

impl WorkerShared {
    async fn notify(&self, task_id: Uuid, status: TaskStatus) {
        if let Some(ref tx) = self.task_finished_tx {
            let _ = tx.send((task_id, status)).await;
        }
    }

    async fn fail(&self, task: &Task, error_result: serde_json::Value) -> Result<()> {
        self.store
            .mark_failed(task.id, error_result)
            .await
            .context("Failed to mark task as failed")?;
        self.notify(task.id, TaskStatus::Failed).await;
        Ok(())
    }

    /// Park the task and push it back onto the channel once the backoff elapses.
    async fn schedule_retry(&self, task: &Task) -> Result<()> {
        let backoff_steps = compute_retry_backoff_seconds(task.retry_count);
        let delay = self
            .config
            .retry_backoff_unit
            .saturating_mul(backoff_steps as u32);

        tracing::info!(
            task_id = %task.id,
            retry_count = task.retry_count + 1,
            backoff_seconds = delay.as_secs_f64(),
            "Scheduling task retry"
        );

        let retried_task = self.store.increment_retry(task.id).await?;
        let task_tx = self.task_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let task_id = retried_task.id;
            if task_tx.send(retried_task).await.is_err() {
                tracing::warn!(task_id = %task_id, "Task queue closed before retry could run");
            }
        });

        Ok(())
    }
}
