//! Observability module
//!
//! Metrics for the extraction pipeline. Logging setup lives in
//! `extraction_core::logging`; the Prometheus exporter is installed by the binary.

pub mod metrics_collector;

pub use metrics_collector::MetricsCollector;
