//! Custodian database layer
//!
//! Repository traits used by the scanners, with PostgreSQL implementations.

pub mod repositories;
pub mod setup;

pub use repositories::{
    PgScanResultRepository, PgUploadRepository, ScanResultRepository, UploadRepository,
};
pub use setup::{connect, run_migrations};
