//! Data model for TxGuard
//!
//! This module contains:
//! - Scoring inputs supplied by the transaction pipeline
//! - Per-factor results and the persisted assessment
//! - Rule configuration

pub mod assessment;
pub mod input;
pub mod rules;

pub use assessment::{
    clamp_score, Action, RiskAssessment, RiskFactor, RiskFactorResult, RiskLevel, FAIL_SAFE_REASON,
};
pub use input::{DeviceContext, Location, TransactionInput, UserContext};
pub use rules::{PatchOutcome, RuleConfig, RuleConfigPatch};
