//! Scanner dispatch
//!
//! Sends stored uploads to external scanning services, stores the verdicts and
//! records per-scanner metrics. Scan failures are logged and counted, never
//! raised: only an unknown upload id is reported back to the caller.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod tasks;

pub use client::{parse_response, ScanRequest, ScannerClient};
pub use dispatcher::{DispatchSettings, ScanDispatcher, ScanOutcome};
pub use error::{ScanError, ScanFailure};
#[cfg(feature = "observability-opentelemetry")]
pub use metrics::OtelMetrics;
pub use metrics::{ScanStatus, ScannerMetrics, TracingMetrics};
pub use tasks::ScannerTasks;

// Test helpers (only available in test mode)
#[cfg(test)]
pub mod test_helpers;
