//! Assessment store
//!
//! Persists assessments for audit and history retrieval, plus the per-user
//! auxiliary data the analyzers read: the transaction history window and the
//! device set. Every mutation is a single atomic primitive (push-and-trim,
//! set-add) so concurrent assessments for one user never race on a
//! read-modify-write.

mod memory;
mod timed;

pub use memory::InMemoryStore;
pub use timed::TimedStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use txguard_core::{RiskAssessment, RuleConfig};

/// One entry of a user's transaction history window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self { amount, timestamp }
    }
}

/// Full rule configuration as of one successful update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub snapshot_id: String,
    pub config: RuleConfig,

    /// Fields the update changed
    pub applied_fields: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl ConfigSnapshot {
    pub fn new(config: RuleConfig, applied_fields: Vec<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            config,
            applied_fields,
            created_at,
        }
    }
}

/// Async store contract
///
/// Implementations back onto any key-value service with per-key expiry and
/// atomic set/list operations.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Persist an assessment with the store's expiry
    async fn save(&self, assessment: &RiskAssessment) -> Result<()>;

    /// Persist an assessment unless an unexpired one with the same
    /// transaction id exists, as one atomic step.
    ///
    /// Returns `None` when this call stored the record, or the existing
    /// record otherwise.
    async fn save_if_absent(&self, assessment: &RiskAssessment) -> Result<Option<RiskAssessment>>;

    /// Look up an unexpired assessment
    async fn get(&self, transaction_id: &str) -> Result<Option<RiskAssessment>>;

    /// A user's assessments, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<RiskAssessment>>;

    /// Every unexpired assessment, newest first
    async fn list_all(&self) -> Result<Vec<RiskAssessment>>;

    /// Push onto the user's history window and trim it to `keep` newest entries
    async fn append_transaction_history(
        &self,
        user_id: &str,
        entry: HistoryEntry,
        keep: usize,
    ) -> Result<()>;

    /// Up to `limit` most recent history entries, newest first
    async fn get_recent_transactions(&self, user_id: &str, limit: usize)
        -> Result<Vec<HistoryEntry>>;

    /// Add a fingerprint to the user's device set.
    ///
    /// Returns `true` when the fingerprint was not in the set before.
    async fn add_device_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<bool>;

    async fn count_devices(&self, user_id: &str) -> Result<usize>;

    async fn is_known_device(&self, user_id: &str, fingerprint: &str) -> Result<bool>;

    async fn save_config_snapshot(&self, snapshot: &ConfigSnapshot) -> Result<()>;

    /// Config snapshots, newest first
    async fn list_config_snapshots(&self) -> Result<Vec<ConfigSnapshot>>;
}

/// Newest first
pub(crate) fn sort_newest_first(assessments: &mut [RiskAssessment]) {
    assessments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
