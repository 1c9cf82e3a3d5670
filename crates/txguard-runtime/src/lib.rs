//! TxGuard Runtime - Scoring runtime for the TxGuard risk engine
//!
//! This crate turns a (transaction, user, device) triple into a score:
//! it fingerprints the device, runs the five factor analyzers, aggregates
//! their weighted scores and maps the resulting level to an action.

pub mod aggregator;
pub mod analyzer;
pub mod clock;
pub mod decision;
pub mod error;
pub mod fingerprint;
pub mod observability;
pub mod rules;
pub mod storage;

// Re-export main types
pub use aggregator::{AggregateScore, FactorWeights, RiskAggregator};
pub use analyzer::{
    AmountAnalyzer, AnalysisContext, BehavioralAnalyzer, DeviceAnalyzer, GeographicAnalyzer,
    RiskAnalyzer, VelocityAnalyzer,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use decision::{decide, Decision};
pub use error::{Result, RuntimeError};
pub use fingerprint::fingerprint;
pub use observability::{Counter, Histogram, Metrics, MetricsCollector};
pub use rules::RuleService;
pub use storage::{AssessmentStore, ConfigSnapshot, HistoryEntry, InMemoryStore, TimedStore};
