use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::Scanner;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RunCustoms,
    RunWat,
}

impl TaskType {
    pub fn scanner(&self) -> Scanner {
        match self {
            TaskType::RunCustoms => Scanner::Customs,
            TaskType::RunWat => Scanner::Wat,
        }
    }

    pub fn for_scanner(scanner: Scanner) -> Self {
        match scanner {
            Scanner::Customs => TaskType::RunCustoms,
            Scanner::Wat => TaskType::RunWat,
        }
    }
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskType::RunCustoms => write!(f, "run_customs"),
            TaskType::RunWat => write!(f, "run_wat"),
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run_customs" => Ok(TaskType::RunCustoms),
            "run_wat" => Ok(TaskType::RunWat),
            _ => Err(anyhow::anyhow!("Invalid task type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Scheduled,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UploadPayload {
    upload_id: i64,
}

impl Task {
    pub fn new(
        task_type: TaskType,
        payload: serde_json::Value,
        max_retries: i32,
        timeout_seconds: Option<i32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_type,
            status: TaskStatus::Pending,
            payload,
            result: None,
            retry_count: 0,
            max_retries,
            timeout_seconds,
            created_at: Utc::now(),
        }
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Upload id carried by scanner tasks: `{"upload_id": <int>}`.
    pub fn upload_id(&self) -> anyhow::Result<i64> {
        let payload: UploadPayload = serde_json::from_value(self.payload.clone())
            .map_err(|e| anyhow::anyhow!("Invalid {} payload: {}", self.task_type, e))?;
        Ok(payload.upload_id)
    }
}
