//! Builder pattern for RiskEngine

use crate::config::{EngineConfig, StorageConfig, StorageType};
use crate::error::{Result, SdkError};
use crate::risk_engine::RiskEngine;
use std::path::PathBuf;
use std::sync::Arc;
use txguard_core::RuleConfig;
use txguard_runtime::{
    AssessmentStore, Clock, InMemoryStore, MetricsCollector, RiskAggregator, RiskAnalyzer,
    RuleService, SystemClock, TimedStore,
};

/// Builder for RiskEngine
///
/// # Example
///
/// ```rust,ignore
/// use txguard_sdk::RiskEngineBuilder;
///
/// // Defaults: built-in rules, in-memory store, metrics on
/// let engine = RiskEngineBuilder::new().build()?;
///
/// // From a YAML file
/// let engine = RiskEngineBuilder::new()
///     .with_config_file("txguard.yaml")
///     .enable_metrics(false)
///     .build()?;
///
/// // Backed by an external store
/// let engine = RiskEngineBuilder::new()
///     .with_store(Arc::new(my_store))
///     .build()?;
/// ```
pub struct RiskEngineBuilder {
    config: EngineConfig,
    config_file: Option<PathBuf>,
    enable_metrics: Option<bool>,
    store: Option<Arc<dyn AssessmentStore>>,
    clock: Option<Arc<dyn Clock>>,
    analyzers: Option<Vec<Arc<dyn RiskAnalyzer>>>,
}

impl RiskEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            config_file: None,
            enable_metrics: None,
            store: None,
            clock: None,
            analyzers: None,
        }
    }

    /// Use an in-process configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a YAML file at build time.
    ///
    /// The file replaces any configuration set with `with_config`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the initial rules
    pub fn with_rules(mut self, rules: RuleConfig) -> Self {
        self.config.rules = rules;
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Back the engine with a caller-supplied store
    pub fn with_store(mut self, store: Arc<dyn AssessmentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the time source (defaults to the system clock)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the built-in analyzers; exactly one per risk factor
    pub fn with_analyzers(mut self, analyzers: Vec<Arc<dyn RiskAnalyzer>>) -> Self {
        self.analyzers = Some(analyzers);
        self
    }

    /// Enable metrics; takes precedence over the loaded configuration
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the risk engine
    pub fn build(self) -> Result<RiskEngine> {
        let mut config = match &self.config_file {
            Some(path) => EngineConfig::from_yaml_file(path)?,
            None => {
                self.config.validate()?;
                self.config
            }
        };
        if let Some(enable) = self.enable_metrics {
            config.enable_metrics = enable;
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let backing: Arc<dyn AssessmentStore> = match (config.storage.storage_type, self.store) {
            (_, Some(store)) => store,
            (StorageType::Memory, None) => Arc::new(
                InMemoryStore::new()
                    .with_assessment_ttl(config.storage.assessment_ttl())
                    .with_device_retention(config.storage.device_retention())
                    .with_clock(clock.clone()),
            ),
            (StorageType::External, None) => {
                return Err(SdkError::ConfigError(
                    "external storage requires a store passed to with_store".to_string(),
                ));
            }
        };
        let store: Arc<dyn AssessmentStore> =
            Arc::new(TimedStore::new(backing, config.storage.timeout()));

        let aggregator = match self.analyzers {
            Some(analyzers) => RiskAggregator::with_analyzers(analyzers)?,
            None => RiskAggregator::new(store.clone()),
        };

        let metrics = config
            .enable_metrics
            .then(|| Arc::new(MetricsCollector::new()));

        tracing::info!(
            "Risk engine ready: storage={:?}, timeout={}ms, metrics={}",
            config.storage.storage_type,
            config.storage.timeout_ms,
            config.enable_metrics
        );

        let rules = RuleService::new(config.rules, store.clone(), clock.clone());
        Ok(RiskEngine::new(store, aggregator, rules, clock, metrics))
    }
}

impl Default for RiskEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
