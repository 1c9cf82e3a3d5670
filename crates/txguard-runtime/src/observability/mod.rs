//! Observability module
//!
//! Logging goes through `tracing`; this module holds the in-process metrics.

pub mod metrics;

pub use metrics::{Counter, Histogram, Metrics, MetricsCollector};
