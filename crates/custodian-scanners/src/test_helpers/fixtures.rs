//! Test fixtures

use chrono::Utc;
use custodian_core::models::{Scanner, ScannerConfig, Upload};
use uuid::Uuid;

pub fn create_test_upload(id: i64, path: &str) -> Upload {
    Upload {
        id,
        uuid: Uuid::new_v4(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        created_at: Utc::now(),
    }
}

pub fn scanner_config(scanner: Scanner, api_url: &str) -> ScannerConfig {
    ScannerConfig {
        scanner,
        api_url: api_url.to_string(),
        api_key: "test-api-key".to_string(),
    }
}
