//! Scanner result persistence

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use custodian_core::models::{NewScanResult, ScanResult};

/// Append-only store of scanner results
#[async_trait]
pub trait ScanResultRepository: Send + Sync {
    async fn create(&self, result: NewScanResult) -> Result<ScanResult>;
}

#[derive(Clone)]
pub struct PgScanResultRepository {
    pool: PgPool,
}

impl PgScanResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanResultRepository for PgScanResultRepository {
    #[tracing::instrument(
        skip(self, result),
        fields(
            db.table = "scanners_results",
            db.operation = "insert",
            upload_id = result.upload_id,
            scanner = %result.scanner
        )
    )]
    async fn create(&self, result: NewScanResult) -> Result<ScanResult> {
        let created = sqlx::query_as::<Postgres, ScanResult>(
            r#"
            INSERT INTO scanners_results (upload_id, scanner, results, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, upload_id, scanner, results, created_at
            "#,
        )
        .bind(result.upload_id)
        .bind(result.scanner)
        .bind(&result.results)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert scanner result")?;

        Ok(created)
    }
}
