//! Core RiskEngine implementation

use super::types::{AssessmentRequest, HistoryQuery};
use crate::error::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use txguard_core::{
    DeviceContext, RiskAssessment, RuleConfig, RuleConfigPatch, TransactionInput, UserContext,
};
use txguard_runtime::{
    decide, fingerprint, AnalysisContext, AssessmentStore, Clock, ConfigSnapshot, HistoryEntry,
    Metrics, MetricsCollector, RiskAggregator, RuleService,
};

/// Per-transaction-id gates: assessments of one id run one at a time
#[derive(Default)]
struct InFlight {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl InFlight {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn acquire(&self, transaction_id: &str) -> InFlightGuard<'_> {
        let slot = self
            .slots()
            .entry(transaction_id.to_string())
            .or_default()
            .clone();
        // Built before waiting so a cancelled waiter still releases its slot
        let mut guard = InFlightGuard {
            owner: self,
            transaction_id: transaction_id.to_string(),
            slot,
            permit: None,
        };
        guard.permit = Some(guard.slot.clone().lock_owned().await);
        guard
    }
}

struct InFlightGuard<'a> {
    owner: &'a InFlight,
    transaction_id: String,
    slot: Arc<AsyncMutex<()>>,
    permit: Option<OwnedMutexGuard<()>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.permit.take();
        let mut slots = self.owner.slots();
        // Only the map and this guard still hold the slot: nobody is waiting
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.transaction_id);
        }
    }
}

/// Transaction risk engine
///
/// Scores a (transaction, user, device) triple and persists the resulting
/// assessment. Assessment never fails from the caller's point of view: any
/// error that prevents a trustworthy score yields the fail-closed
/// HIGH/BLOCK record instead.
pub struct RiskEngine {
    store: Arc<dyn AssessmentStore>,
    aggregator: RiskAggregator,
    rules: RuleService,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<MetricsCollector>>,
    in_flight: InFlight,
}

impl RiskEngine {
    pub(crate) fn new(
        store: Arc<dyn AssessmentStore>,
        aggregator: RiskAggregator,
        rules: RuleService,
        clock: Arc<dyn Clock>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            store,
            aggregator,
            rules,
            clock,
            metrics,
            in_flight: InFlight::default(),
        }
    }

    /// Score a transaction.
    ///
    /// Re-submitting a transaction id whose assessment is still stored returns
    /// that assessment unchanged. Concurrent calls for one id are serialized,
    /// and the store's atomic claim settles races with other engine instances,
    /// so exactly one call scores and records each transaction.
    pub async fn assess(
        &self,
        transaction: TransactionInput,
        user: UserContext,
        device: DeviceContext,
    ) -> RiskAssessment {
        let started = Instant::now();
        let transaction_id = transaction.transaction_id.clone();
        let _claim = self.in_flight.acquire(&transaction_id).await;

        match self.store.get(&transaction_id).await {
            Ok(Some(existing)) => {
                tracing::debug!("Transaction {} already assessed", transaction_id);
                return existing;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "Could not check for an existing assessment of {}: {}",
                    transaction_id,
                    e
                );
            }
        }

        let now = self.clock.now();
        let rules = self.rules.current().await;
        let history_limit = rules.history_limit as usize;
        let ctx = AnalysisContext {
            fingerprint: fingerprint(&device),
            transaction,
            user,
            device,
            now,
            rules,
        };
        let user_id = ctx.transaction.user_id.clone();
        let amount = ctx.transaction.amount;

        let aggregate = self.aggregator.evaluate(ctx).await;
        let decision = decide(aggregate.level);

        let assessment = RiskAssessment {
            transaction_id: transaction_id.clone(),
            user_id: user_id.clone(),
            score: aggregate.score,
            level: aggregate.level,
            reasons: aggregate.reasons.clone(),
            action: decision.action,
            requires_review: decision.requires_review,
            timestamp: now.with_timezone(&Utc),
        };

        match self.store.save_if_absent(&assessment).await {
            Ok(None) => {}
            Ok(Some(existing)) => {
                tracing::debug!("Transaction {} was assessed elsewhere first", transaction_id);
                return existing;
            }
            Err(e) => {
                tracing::error!("Failed to persist assessment {}: {}", transaction_id, e);
            }
        }

        if !aggregate.is_fail_safe() {
            let entry = HistoryEntry::new(amount, assessment.timestamp);
            if let Err(e) = self
                .store
                .append_transaction_history(&user_id, entry, history_limit)
                .await
            {
                tracing::warn!("Failed to record history for user {}: {}", user_id, e);
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_assessment(assessment.action, started.elapsed());
            for factor in aggregate.degraded_factors() {
                metrics.record_degraded(factor);
            }
            if aggregate.is_fail_safe() {
                metrics.record_fail_safe();
            }
        }

        tracing::info!(
            "Assessed transaction {} for user {}: score={:.4} level={} action={}",
            assessment.transaction_id,
            assessment.user_id,
            assessment.score,
            assessment.level,
            assessment.action
        );

        assessment
    }

    /// Score a request deserialized from the pipeline
    pub async fn assess_request(&self, request: AssessmentRequest) -> RiskAssessment {
        self.assess(request.transaction, request.user, request.device)
            .await
    }

    /// Apply the valid fields of a partial rule update
    pub async fn update_rules(&self, patch: &RuleConfigPatch) -> bool {
        self.rules.update(patch).await
    }

    /// Apply a loosely-typed rule update; unknown or mistyped keys are ignored
    pub async fn update_rules_json(&self, patch: &serde_json::Value) -> bool {
        self.update_rules(&RuleConfigPatch::from_json(patch)).await
    }

    /// Rules currently in effect
    pub async fn rules(&self) -> Arc<RuleConfig> {
        self.rules.current().await
    }

    /// Audit trail of rule updates, newest first
    pub async fn config_snapshots(&self) -> Result<Vec<ConfigSnapshot>> {
        Ok(self.rules.snapshots().await?)
    }

    /// Stored assessments matching `query`, newest first
    pub async fn get_history(&self, query: &HistoryQuery) -> Result<Vec<RiskAssessment>> {
        let assessments = match (&query.transaction_id, &query.user_id) {
            (Some(transaction_id), user_id) => self
                .store
                .get(transaction_id)
                .await?
                .into_iter()
                .filter(|a| user_id.as_ref().map_or(true, |u| &a.user_id == u))
                .collect(),
            (None, Some(user_id)) => self.store.list_by_user(user_id).await?,
            (None, None) => self.store.list_all().await?,
        };
        Ok(assessments)
    }

    /// Whether `device` has been seen for `user_id` before
    pub async fn is_known_device(&self, user_id: &str, device: &DeviceContext) -> Result<bool> {
        Ok(self
            .store
            .is_known_device(user_id, &fingerprint(device))
            .await?)
    }

    /// Metrics collector, when metrics are enabled
    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }
}
