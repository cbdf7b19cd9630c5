//! Per-scanner metrics: a request timer and success/failure counters.
//!
//! Keys are `devhub.<name>` for the timer and `devhub.<name>.<status>` for
//! the counters.

#[cfg(feature = "observability-opentelemetry")]
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

use custodian_core::models::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Success,
    Failure,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Success => "success",
            ScanStatus::Failure => "failure",
        }
    }
}

/// Counter key for a scan outcome, e.g. `devhub.wat.failure`.
pub fn outcome_key(scanner: Scanner, status: ScanStatus) -> String {
    format!("{}.{}", scanner.metric_key(), status.as_str())
}

pub trait ScannerMetrics: Send + Sync {
    /// Time spent signing the download link and waiting on the scanner.
    fn record_request_duration(&self, scanner: Scanner, elapsed: Duration);

    fn record_outcome(&self, scanner: Scanner, status: ScanStatus);
}

/// Emits metrics as structured tracing events on the `custodian::metrics` target.
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics;

impl ScannerMetrics for TracingMetrics {
    fn record_request_duration(&self, scanner: Scanner, elapsed: Duration) {
        tracing::info!(
            target: "custodian::metrics",
            metric = %scanner.metric_key(),
            kind = "timer",
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "metric"
        );
    }

    fn record_outcome(&self, scanner: Scanner, status: ScanStatus) {
        tracing::info!(
            target: "custodian::metrics",
            metric = %outcome_key(scanner, status),
            kind = "counter",
            value = 1u64,
            "metric"
        );
    }
}

#[derive(Clone)]
#[cfg(feature = "observability-opentelemetry")]
pub struct OtelMetrics {
    runs: Counter<u64>,
    request_duration: Histogram<f64>,
}

#[cfg(feature = "observability-opentelemetry")]
impl OtelMetrics {
    pub fn new(meter: Meter) -> Self {
        let runs = meter
            .u64_counter("scanner.runs")
            .with_description("Completed scanner runs by outcome")
            .build();

        let request_duration = meter
            .f64_histogram("scanner.request.duration")
            .with_description("Scanner request duration in seconds")
            .with_unit("s")
            .build();

        Self {
            runs,
            request_duration,
        }
    }

    /// Metrics bound to the globally installed meter provider.
    pub fn from_global() -> Self {
        Self::new(opentelemetry::global::meter("custodian"))
    }
}

#[cfg(feature = "observability-opentelemetry")]
impl ScannerMetrics for OtelMetrics {
    fn record_request_duration(&self, scanner: Scanner, elapsed: Duration) {
        self.request_duration.record(
            elapsed.as_secs_f64(),
            &[KeyValue::new("scanner", scanner.name())],
        );
    }

    fn record_outcome(&self, scanner: Scanner, status: ScanStatus) {
        self.runs.add(
            1,
            &[
                KeyValue::new("scanner", scanner.name()),
                KeyValue::new("status", status.as_str()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_keys_are_namespaced_per_scanner() {
        assert_eq!(
            outcome_key(Scanner::Customs, ScanStatus::Success),
            "devhub.customs.success"
        );
        assert_eq!(
            outcome_key(Scanner::Wat, ScanStatus::Failure),
            "devhub.wat.failure"
        );
    }
}
