//! Runtime error types

use thiserror::Error;
use txguard_core::{CoreError, RiskFactor};

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Backing store could not serve the request
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store call exceeded its time budget
    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    StoreTimeout { operation: String, timeout_ms: u64 },

    /// Scoring input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] CoreError),

    /// An analyzer signalled a non-recoverable condition
    #[error("Analyzer '{factor}' failed: {message}")]
    AnalyzerFailed { factor: RiskFactor, message: String },

    /// Analyzer set does not cover every factor exactly once
    #[error("Invalid analyzer set: {0}")]
    InvalidAnalyzers(String),
}

impl RuntimeError {
    /// Store-side failures the analyzers degrade on
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            RuntimeError::StoreUnavailable(_) | RuntimeError::StoreTimeout { .. }
        )
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
