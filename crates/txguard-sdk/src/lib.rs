//! TxGuard SDK
//!
//! High-level API for scoring money transfers: build a [`RiskEngine`], hand it
//! a transaction, the sending user and the reporting device, and act on the
//! returned [`RiskAssessment`].

pub mod builder;
pub mod config;
pub mod error;
pub mod risk_engine;

// Re-export main types
pub use builder::RiskEngineBuilder;
pub use config::{EngineConfig, StorageConfig, StorageType};
pub use error::{Result, SdkError};
pub use risk_engine::{AssessmentRequest, HistoryQuery, RiskEngine};

// Re-export commonly used types from dependencies
pub use txguard_core::{
    Action, DeviceContext, RiskAssessment, RiskFactor, RiskLevel, RuleConfig, RuleConfigPatch,
    TransactionInput, UserContext,
};
pub use txguard_runtime::{
    AssessmentStore, Clock, ConfigSnapshot, FixedClock, InMemoryStore, Metrics, MetricsCollector,
    RiskAnalyzer,
};
