//! Custodian CLI: run content scanners against stored uploads.
//!
//! Configuration comes from the environment (a `.env` file is honoured).

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use custodian_cli::{init_tracing, AppState};
use custodian_core::models::{Scanner, TaskStatus, TaskType};
use custodian_core::Config;
use custodian_db::{connect, run_migrations, PgScanResultRepository, PgUploadRepository};
use custodian_scanners::{
    DispatchSettings, ScanDispatcher, ScannerClient, ScannerMetrics, ScannerTasks,
};
use custodian_storage::create_storage;
use custodian_worker::{TaskHandlerContext, TaskQueue, TaskQueueConfig};

#[derive(Parser)]
#[command(name = "custodian", about = "Run content scanners against stored uploads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send uploads to a scanner and store the verdicts
    Scan {
        /// Scanner to run: customs or wat
        #[arg(long)]
        scanner: Scanner,
        /// Upload ids
        #[arg(required = true)]
        upload_ids: Vec<i64>,
    },
    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.json_logs());

    tracing::info!(environment = %config.environment, "Custodian starting");

    match cli.command {
        Commands::Migrate => {
            let pool = connect(&config).await?;
            run_migrations(&pool).await?;
        }
        Commands::Scan {
            scanner,
            upload_ids,
        } => scan(&config, scanner, upload_ids).await?,
    }

    Ok(())
}

fn scanner_metrics() -> Arc<dyn ScannerMetrics> {
    #[cfg(feature = "observability-opentelemetry")]
    {
        Arc::new(custodian_scanners::OtelMetrics::from_global())
    }
    #[cfg(not(feature = "observability-opentelemetry"))]
    {
        Arc::new(custodian_scanners::TracingMetrics)
    }
}

async fn scan(config: &Config, scanner: Scanner, upload_ids: Vec<i64>) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let storage = create_storage(config)
        .await
        .context("Failed to initialize upload storage")?;

    let dispatcher = ScanDispatcher::new(
        Arc::new(PgUploadRepository::new(pool.clone())),
        Arc::new(PgScanResultRepository::new(pool)),
        storage,
        ScannerClient::new()?,
        scanner_metrics(),
        DispatchSettings {
            request_timeout: config.scanner_timeout(),
            download_url_ttl: config.download_url_ttl(),
        },
    );
    let state = Arc::new(AppState::new(ScannerTasks::new(
        Arc::new(dispatcher),
        config,
    )));
    let context: Arc<dyn TaskHandlerContext> = state.clone();

    let (finished_tx, mut finished_rx) = mpsc::channel(upload_ids.len().max(1));
    let queue = TaskQueue::new(
        TaskQueueConfig::from(config),
        Arc::downgrade(&context),
        Some(finished_tx),
    );

    let task_type = TaskType::for_scanner(scanner);
    let mut pending = HashMap::new();
    for upload_id in upload_ids {
        let task_id = queue
            .submit_task(task_type, json!({ "upload_id": upload_id }))
            .await?;
        pending.insert(task_id, upload_id);
    }

    let mut failed = 0usize;
    while !pending.is_empty() {
        let Some((task_id, status)) = finished_rx.recv().await else {
            break;
        };
        let Some(upload_id) = pending.remove(&task_id) else {
            continue;
        };
        if status == TaskStatus::Failed {
            failed += 1;
        }

        let result = queue
            .get_task(task_id)
            .await
            .and_then(|task| task.result)
            .unwrap_or_else(|| json!({ "upload_id": upload_id }));
        println!(
            "{}",
            json!({ "task_id": task_id, "status": status.to_string(), "result": result })
        );
    }

    queue.shutdown().await;

    tracing::info!(
        scanner = %scanner,
        failed_tasks = failed,
        "Scan run finished"
    );

    if failed > 0 {
        anyhow::bail!("{} scan task(s) failed", failed);
    }
    Ok(())
}
