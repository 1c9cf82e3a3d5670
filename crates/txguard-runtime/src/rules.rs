//! Rule configuration service
//!
//! Owns the live [`RuleConfig`]. Readers take an `Arc` snapshot that stays
//! stable for the whole assessment; updates go through validate, snapshot,
//! then swap.

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{AssessmentStore, ConfigSnapshot};
use std::sync::Arc;
use tokio::sync::RwLock;
use txguard_core::{RuleConfig, RuleConfigPatch};

/// Live rule configuration with an audited update path
pub struct RuleService {
    current: RwLock<Arc<RuleConfig>>,
    store: Arc<dyn AssessmentStore>,
    clock: Arc<dyn Clock>,
}

impl RuleService {
    pub fn new(config: RuleConfig, store: Arc<dyn AssessmentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
            store,
            clock,
        }
    }

    /// The configuration in effect right now
    pub async fn current(&self) -> Arc<RuleConfig> {
        self.current.read().await.clone()
    }

    /// Apply the valid fields of `patch`.
    ///
    /// Returns `true` when at least one field changed and the resulting
    /// configuration was snapshotted. If the snapshot cannot be persisted the
    /// live configuration is left untouched.
    pub async fn update(&self, patch: &RuleConfigPatch) -> bool {
        let mut current = self.current.write().await;
        let mut next = RuleConfig::clone(&current);
        let outcome = next.apply_patch(patch);

        if !outcome.has_changes() {
            tracing::info!(
                "Rule update changed nothing ({} fields rejected)",
                outcome.rejected.len()
            );
            return false;
        }

        let snapshot = ConfigSnapshot::new(
            next.clone(),
            outcome.applied.clone(),
            self.clock.now().with_timezone(&chrono::Utc),
        );
        if let Err(e) = self.store.save_config_snapshot(&snapshot).await {
            tracing::error!("Could not persist rule snapshot, update discarded: {}", e);
            return false;
        }

        *current = Arc::new(next);
        tracing::info!(
            "Rules updated ({}), snapshot {}",
            outcome.applied.join(", "),
            snapshot.snapshot_id
        );
        true
    }

    /// Snapshots of every successful update, newest first
    pub async fn snapshots(&self) -> Result<Vec<ConfigSnapshot>> {
        self.store.list_config_snapshots().await
    }
}
