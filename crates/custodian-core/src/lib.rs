//! Custodian Core Library
//!
//! Domain models, configuration and task error types shared by every
//! Custodian crate.

pub mod config;
pub mod constants;
pub mod models;
pub mod task_error;

pub use config::{Config, ScannerSettings};
pub use task_error::{TaskError, TaskResultExt};
