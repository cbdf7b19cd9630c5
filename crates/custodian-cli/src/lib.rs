//! Custodian CLI support: application state, task dispatch and tracing setup.

pub mod state;
pub mod telemetry;

pub use state::{outcome_summary, AppState};
pub use telemetry::init_tracing;
