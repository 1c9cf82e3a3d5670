//! Configuration types for RiskEngine

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use txguard_core::RuleConfig;

/// Main engine configuration
///
/// Loadable from YAML; every section is optional and falls back to defaults.
/// Keys are camelCase throughout and unknown keys are rejected:
///
/// ```yaml
/// enableMetrics: true
/// storage:
///   storageType: memory
///   timeoutMs: 250
///   assessmentTtlHours: 24
///   deviceRetentionDays: 90
/// rules:
///   maxSingleTransaction: 10000
///   allowedCountries: [US, CA, MX]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Initial scoring rules
    pub rules: RuleConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl EngineConfig {
    /// Create a new engine configuration with default rules and in-memory storage
    pub fn new() -> Self {
        Self {
            rules: RuleConfig::default(),
            storage: StorageConfig::default(),
            enable_metrics: true,
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::info!("Loading engine config from {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Set the rules
    pub fn with_rules(mut self, rules: RuleConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Enable metrics
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        self.storage.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StorageConfig {
    pub storage_type: StorageType,

    /// Per-call budget for store operations
    pub timeout_ms: u64,

    /// Assessment expiry
    pub assessment_ttl_hours: u32,

    /// Devices unseen for longer than this stop counting; `None` keeps them forever
    pub device_retention_days: Option<u32>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
            timeout_ms: 250,
            assessment_ttl_hours: 24,
            device_retention_days: Some(90),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn assessment_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.assessment_ttl_hours))
    }

    pub fn device_retention(&self) -> Option<chrono::Duration> {
        self.device_retention_days
            .map(|days| chrono::Duration::days(i64::from(days)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(SdkError::ConfigError(
                "storage.timeoutMs must be greater than 0".to_string(),
            ));
        }
        if self.assessment_ttl_hours == 0 {
            return Err(SdkError::ConfigError(
                "storage.assessmentTtlHours must be greater than 0".to_string(),
            ));
        }
        if self.device_retention_days == Some(0) {
            return Err(SdkError::ConfigError(
                "storage.deviceRetentionDays must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Built-in in-memory store
    Memory,

    /// Caller-supplied store, passed to the builder with `with_store`
    External,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.enable_metrics);
        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert_eq!(config.storage.timeout(), Duration::from_millis(250));
        assert_eq!(config.storage.assessment_ttl(), chrono::Duration::hours(24));
        assert_eq!(
            config.storage.device_retention(),
            Some(chrono::Duration::days(90))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str(
            r#"
enableMetrics: false
storage:
  timeoutMs: 100
rules:
  maxSingleTransaction: 2500
  highRiskCountries: [NG]
"#,
        )
        .unwrap();

        assert!(!config.enable_metrics);
        assert_eq!(config.storage.timeout_ms, 100);
        assert_eq!(config.storage.assessment_ttl_hours, 24);
        assert_eq!(config.rules.max_single_transaction, 2500.0);
        assert_eq!(config.rules.max_daily_transactions, 10);
        assert_eq!(config.rules.high_risk_countries.len(), 1);
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let err = EngineConfig::from_yaml_str("rules:\n  maxDailyAmount: -5\n").unwrap_err();
        assert!(matches!(err, SdkError::Core(_)));

        let err = EngineConfig::from_yaml_str(
            "rules:\n  mediumRiskThreshold: 0.9\n  highRiskThreshold: 0.8\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("mediumRiskThreshold"));
    }

    #[test]
    fn test_invalid_storage_is_rejected() {
        let err = EngineConfig::from_yaml_str("storage:\n  timeoutMs: 0\n").unwrap_err();
        assert!(matches!(err, SdkError::ConfigError(_)));
        assert!(err.to_string().contains("storage.timeoutMs"));

        assert!(EngineConfig::from_yaml_str("storage:\n  deviceRetentionDays: ~\n").is_ok());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = EngineConfig::from_yaml_str("storage: [1, 2").unwrap_err();
        assert!(matches!(err, SdkError::Yaml(_)));
    }

    #[test]
    fn test_external_storage_type() {
        let config = EngineConfig::from_yaml_str("storage:\n  storageType: external\n").unwrap();
        assert_eq!(config.storage.storage_type, StorageType::External);
    }

    #[test]
    fn test_every_section_uses_camel_case_keys() {
        let config = EngineConfig::from_yaml_str(
            r#"
enableMetrics: false
storage:
  storageType: memory
  timeoutMs: 400
  assessmentTtlHours: 12
  deviceRetentionDays: 30
rules:
  velocityWindowMinutes: 15
"#,
        )
        .unwrap();

        assert!(!config.enable_metrics);
        assert_eq!(config.storage.timeout_ms, 400);
        assert_eq!(config.storage.assessment_ttl_hours, 12);
        assert_eq!(config.storage.device_retention_days, Some(30));
        assert_eq!(config.rules.velocity_window_minutes, 15);

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("enableMetrics"));
        assert!(yaml.contains("timeoutMs"));
    }

    #[test]
    fn test_snake_case_keys_are_rejected() {
        let err = EngineConfig::from_yaml_str("enable_metrics: false\n").unwrap_err();
        assert!(matches!(err, SdkError::Yaml(_)));

        let err = EngineConfig::from_yaml_str("storage:\n  timeout_ms: 100\n").unwrap_err();
        assert!(matches!(err, SdkError::Yaml(_)));
    }
}
