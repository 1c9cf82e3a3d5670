//! TxGuard Core - Core types and definitions for the TxGuard risk engine
//!
//! This crate provides the plain data shared across the TxGuard workspace:
//! - Scoring inputs (transaction, user and device snapshots)
//! - Factor results and the durable risk assessment record
//! - Runtime-mutable rule configuration and its validated patch type
//! - Error types

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use types::{
    clamp_score, Action, DeviceContext, Location, PatchOutcome, RiskAssessment, RiskFactor,
    RiskFactorResult, RiskLevel, RuleConfig, RuleConfigPatch, TransactionInput, UserContext,
    FAIL_SAFE_REASON,
};
