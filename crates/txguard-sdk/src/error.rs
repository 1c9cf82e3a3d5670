//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed YAML configuration
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] txguard_runtime::RuntimeError),

    /// Invalid rule values or scoring input
    #[error("Validation error: {0}")]
    Core(#[from] txguard_core::CoreError),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
