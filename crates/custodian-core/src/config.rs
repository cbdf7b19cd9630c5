//! Configuration module
//!
//! Environment-driven settings for the scanner workers: database, storage,
//! download link signing, scanner endpoints and the task queue.

use std::env;
use std::time::Duration;

use crate::models::{Scanner, ScannerConfig};

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SCANNER_TIMEOUT_SECS: u64 = 60;
const DOWNLOAD_URL_TTL_SECS: u64 = 3600;
const TASK_QUEUE_MAX_WORKERS: usize = 4;
const TASK_QUEUE_MAX_RETRIES: i32 = 3;
const TASK_QUEUE_DEFAULT_TIMEOUT_SECS: i32 = 300;
const MIN_SECRET_LEN: usize = 32;

/// Endpoint and credentials for one scanner
#[derive(Clone)]
pub struct ScannerSettings {
    pub api_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ScannerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ScannerSettings {
    fn from_env(url_var: &str, key_var: &str) -> Self {
        Self {
            api_url: env::var(url_var).unwrap_or_default().trim().to_string(),
            api_key: env::var(key_var).unwrap_or_default(),
        }
    }

    fn validate(&self, scanner: Scanner) -> Result<(), anyhow::Error> {
        let prefix = scanner.name().to_uppercase();
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("{}_API_URL must be set", prefix));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "{}_API_URL must be an http(s) URL, got {}",
                prefix,
                self.api_url
            ));
        }
        if self.api_key.is_empty() {
            return Err(anyhow::anyhow!("{}_API_KEY must be set", prefix));
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Timeout applied to every scanner request
    pub scanner_timeout_secs: u64,
    pub customs: ScannerSettings,
    pub wat: ScannerSettings,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    /// HMAC key for signed download links handed to scanners
    pub download_url_secret: String,
    pub download_url_ttl_secs: u64,
    pub task_queue_max_workers: usize,
    pub task_queue_max_retries: i32,
    pub task_queue_default_timeout_seconds: i32,
    /// `json` for structured logs, anything else for the compact console format
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Config {
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            scanner_timeout_secs: env::var("SCANNER_TIMEOUT")
                .unwrap_or_else(|_| SCANNER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(SCANNER_TIMEOUT_SECS),
            customs: ScannerSettings::from_env("CUSTOMS_API_URL", "CUSTOMS_API_KEY"),
            wat: ScannerSettings::from_env("WAT_API_URL", "WAT_API_KEY"),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .map_err(|_| anyhow::anyhow!("LOCAL_STORAGE_PATH must be set"))?,
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .map_err(|_| anyhow::anyhow!("LOCAL_STORAGE_BASE_URL must be set"))?,
            download_url_secret: env::var("DOWNLOAD_URL_SECRET")
                .map_err(|_| anyhow::anyhow!("DOWNLOAD_URL_SECRET must be set"))?,
            download_url_ttl_secs: env::var("DOWNLOAD_URL_TTL_SECS")
                .unwrap_or_else(|_| DOWNLOAD_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_URL_TTL_SECS),
            task_queue_max_workers: env::var("TASK_QUEUE_MAX_WORKERS")
                .unwrap_or_else(|_| TASK_QUEUE_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_MAX_WORKERS),
            task_queue_max_retries: env::var("TASK_QUEUE_MAX_RETRIES")
                .unwrap_or_else(|_| TASK_QUEUE_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_MAX_RETRIES),
            task_queue_default_timeout_seconds: env::var("TASK_QUEUE_DEFAULT_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| TASK_QUEUE_DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_DEFAULT_TIMEOUT_SECS),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.download_url_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "DOWNLOAD_URL_SECRET must be at least {} characters long",
                MIN_SECRET_LEN
            ));
        }

        if self.scanner_timeout_secs == 0 {
            return Err(anyhow::anyhow!("SCANNER_TIMEOUT must be greater than zero"));
        }

        if self.task_queue_max_workers == 0 {
            return Err(anyhow::anyhow!(
                "TASK_QUEUE_MAX_WORKERS must be greater than zero"
            ));
        }

        // A scan, including its lookup and insert, must finish inside the task timeout.
        let scan_budget = self.scanner_timeout_secs.saturating_add(self.db_timeout_seconds);
        if u64::try_from(self.task_queue_default_timeout_seconds).unwrap_or(0) <= scan_budget {
            return Err(anyhow::anyhow!(
                "TASK_QUEUE_DEFAULT_TIMEOUT_SECONDS ({}) must exceed SCANNER_TIMEOUT plus DB_TIMEOUT_SECONDS ({})",
                self.task_queue_default_timeout_seconds,
                scan_budget
            ));
        }

        self.customs.validate(Scanner::Customs)?;
        self.wat.validate(Scanner::Wat)?;

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn scanner_timeout(&self) -> Duration {
        Duration::from_secs(self.scanner_timeout_secs)
    }

    pub fn download_url_ttl(&self) -> Duration {
        Duration::from_secs(self.download_url_ttl_secs)
    }

    /// Endpoint descriptor for the given scanner.
    pub fn scanner_config(&self, scanner: Scanner) -> ScannerConfig {
        let settings = match scanner {
            Scanner::Customs => &self.customs,
            Scanner::Wat => &self.wat,
        };
        ScannerConfig {
            scanner,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}
