//! Upload lookups

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use custodian_core::models::Upload;

/// Read access to uploads. Scanners never modify them.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Upload>>;
}

#[derive(Clone)]
pub struct PgUploadRepository {
    pool: PgPool,
}

impl PgUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "select"))]
    async fn get(&self, id: i64) -> Result<Option<Upload>> {
        let upload = sqlx::query_as::<Postgres, Upload>(
            r#"
            SELECT id, uuid, name, path, created_at
            FROM file_uploads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch upload")?;

        Ok(upload)
    }
}
