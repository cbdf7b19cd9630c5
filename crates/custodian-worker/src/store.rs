//! In-memory task bookkeeping

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use custodian_core::models::{Task, TaskStatus};

/// Latest known state of every submitted task.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    pub async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    pub async fn update_status(&self, id: Uuid, status: TaskStatus) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Task {} not found", id))?;
        task.status = status;
        Ok(())
    }

    pub async fn mark_completed(&self, id: Uuid, result: serde_json::Value) -> Result<()> {
        self.finish(id, TaskStatus::Completed, result).await
    }

    pub async fn mark_failed(&self, id: Uuid, result: serde_json::Value) -> Result<()> {
        self.finish(id, TaskStatus::Failed, result).await
    }

    /// Bump the retry counter and park the task as `Scheduled`.
    pub async fn increment_retry(&self, id: Uuid) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Task {} not found", id))?;
        task.retry_count += 1;
        task.status = TaskStatus::Scheduled;
        Ok(task.clone())
    }

    async fn finish(&self, id: Uuid, status: TaskStatus, result: serde_json::Value) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Task {} not found", id))?;
        task.status = status;
        task.result = Some(result);
        Ok(())
    }
}
