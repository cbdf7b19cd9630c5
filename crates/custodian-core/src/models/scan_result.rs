use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Scanner;

/// Persisted outcome of one scanner run against one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScanResult {
    pub id: i64,
    pub upload_id: i64,
    pub scanner: Scanner,
    /// Scanner response payload, stored verbatim.
    pub results: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a scan result
#[derive(Debug, Clone)]
pub struct NewScanResult {
    pub upload_id: i64,
    pub scanner: Scanner,
    pub results: serde_json::Value,
}
