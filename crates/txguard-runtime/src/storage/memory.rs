//! In-memory assessment store
//!
//! Suitable for a single process and for tests. Each map sits behind its own
//! lock and every trait operation takes that lock once, which gives the same
//! per-key atomicity a key-value service offers for set-add and list-push.
//!
//! Expired assessments are skipped on read and swept out on the next save
//! once [`SWEEP_INTERVAL_SECS`] have passed since the previous sweep.

use super::{sort_newest_first, AssessmentStore, ConfigSnapshot, HistoryEntry};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use txguard_core::RiskAssessment;

/// Default lifetime of a saved assessment
pub const DEFAULT_ASSESSMENT_TTL_HOURS: i64 = 24;

/// Minimum spacing between expiry sweeps triggered by saves
pub const SWEEP_INTERVAL_SECS: i64 = 300;

type AssessmentMap = HashMap<String, StoredAssessment>;

#[derive(Debug, Clone)]
struct StoredAssessment {
    assessment: RiskAssessment,
    expires_at: DateTime<Utc>,
}

/// In-memory store with assessment expiry and optional device retention
pub struct InMemoryStore {
    assessments: RwLock<AssessmentMap>,

    /// Unix seconds of the last expiry sweep
    last_sweep: AtomicI64,

    /// user_id -> history, newest first
    history: RwLock<HashMap<String, VecDeque<HistoryEntry>>>,

    /// user_id -> fingerprint -> last seen
    devices: RwLock<HashMap<String, HashMap<String, DateTime<Utc>>>>,

    snapshots: RwLock<Vec<ConfigSnapshot>>,

    assessment_ttl: Duration,

    /// Fingerprints not seen within this window no longer count
    device_retention: Option<Duration>,

    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create a store with a 24 hour assessment TTL and no device retention limit
    pub fn new() -> Self {
        Self {
            assessments: RwLock::new(HashMap::new()),
            last_sweep: AtomicI64::new(i64::MIN),
            history: RwLock::new(HashMap::new()),
            devices: RwLock::new(HashMap::new()),
            snapshots: RwLock::new(Vec::new()),
            assessment_ttl: Duration::hours(DEFAULT_ASSESSMENT_TTL_HOURS),
            device_retention: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_assessment_ttl(mut self, ttl: Duration) -> Self {
        self.assessment_ttl = ttl;
        self
    }

    pub fn with_device_retention(mut self, retention: Option<Duration>) -> Self {
        self.device_retention = retention;
        self
    }

    /// Clock used for expiry and device last-seen stamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn is_fresh(&self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.device_retention {
            Some(retention) => now - last_seen <= retention,
            None => true,
        }
    }

    /// Drop expired assessments. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.now();
        let mut assessments = self.assessments.write().await;
        self.sweep(&mut assessments, now)
    }

    /// Number of assessment records held, expired or not
    pub async fn stored_assessments(&self) -> usize {
        self.assessments.read().await.len()
    }

    fn sweep(&self, assessments: &mut AssessmentMap, now: DateTime<Utc>) -> usize {
        self.last_sweep.store(now.timestamp(), Ordering::Relaxed);
        let before = assessments.len();
        assessments.retain(|_, stored| stored.expires_at > now);
        let removed = before - assessments.len();
        if removed > 0 {
            tracing::debug!("Purged {} expired assessments", removed);
        }
        removed
    }

    /// Sweep when the interval has passed; callers hold the write lock
    fn sweep_if_due(&self, assessments: &mut AssessmentMap, now: DateTime<Utc>) {
        let last = self.last_sweep.load(Ordering::Relaxed);
        if now.timestamp().saturating_sub(last) >= SWEEP_INTERVAL_SECS {
            self.sweep(assessments, now);
        }
    }

    fn stored(&self, assessment: &RiskAssessment, now: DateTime<Utc>) -> StoredAssessment {
        StoredAssessment {
            assessment: assessment.clone(),
            expires_at: now + self.assessment_ttl,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssessmentStore for InMemoryStore {
    async fn save(&self, assessment: &RiskAssessment) -> Result<()> {
        let now = self.now();
        let mut assessments = self.assessments.write().await;
        self.sweep_if_due(&mut assessments, now);
        assessments.insert(
            assessment.transaction_id.clone(),
            self.stored(assessment, now),
        );
        Ok(())
    }

    async fn save_if_absent(&self, assessment: &RiskAssessment) -> Result<Option<RiskAssessment>> {
        let now = self.now();
        let mut assessments = self.assessments.write().await;
        self.sweep_if_due(&mut assessments, now);

        if let Some(existing) = assessments
            .get(&assessment.transaction_id)
            .filter(|stored| stored.expires_at > now)
        {
            return Ok(Some(existing.assessment.clone()));
        }

        assessments.insert(
            assessment.transaction_id.clone(),
            self.stored(assessment, now),
        );
        Ok(None)
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<RiskAssessment>> {
        let now = self.now();
        let assessments = self.assessments.read().await;
        Ok(assessments
            .get(transaction_id)
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.assessment.clone()))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<RiskAssessment>> {
        let now = self.now();
        let assessments = self.assessments.read().await;
        let mut found: Vec<RiskAssessment> = assessments
            .values()
            .filter(|stored| stored.expires_at > now && stored.assessment.user_id == user_id)
            .map(|stored| stored.assessment.clone())
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<RiskAssessment>> {
        let now = self.now();
        let assessments = self.assessments.read().await;
        let mut found: Vec<RiskAssessment> = assessments
            .values()
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.assessment.clone())
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    async fn append_transaction_history(
        &self,
        user_id: &str,
        entry: HistoryEntry,
        keep: usize,
    ) -> Result<()> {
        let mut history = self.history.write().await;
        let window = history.entry(user_id.to_string()).or_default();
        window.push_front(entry);
        window.truncate(keep);
        Ok(())
    }

    async fn get_recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        let history = self.history.read().await;
        Ok(history
            .get(user_id)
            .map(|window| window.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn add_device_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<bool> {
        let now = self.now();
        let mut devices = self.devices.write().await;
        let set = devices.entry(user_id.to_string()).or_default();

        let previous = set.insert(fingerprint.to_string(), now);
        let is_new = match previous {
            None => true,
            Some(last_seen) => !self.is_fresh(last_seen, now),
        };

        if self.device_retention.is_some() {
            set.retain(|_, last_seen| self.is_fresh(*last_seen, now));
        }

        Ok(is_new)
    }

    async fn count_devices(&self, user_id: &str) -> Result<usize> {
        let now = self.now();
        let devices = self.devices.read().await;
        Ok(devices
            .get(user_id)
            .map(|set| {
                set.values()
                    .filter(|last_seen| self.is_fresh(**last_seen, now))
                    .count()
            })
            .unwrap_or(0))
    }

    async fn is_known_device(&self, user_id: &str, fingerprint: &str) -> Result<bool> {
        let now = self.now();
        let devices = self.devices.read().await;
        Ok(devices
            .get(user_id)
            .and_then(|set| set.get(fingerprint))
            .map(|last_seen| self.is_fresh(*last_seen, now))
            .unwrap_or(false))
    }

    async fn save_config_snapshot(&self, snapshot: &ConfigSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.push(snapshot.clone());
        Ok(())
    }

    async fn list_config_snapshots(&self) -> Result<Vec<ConfigSnapshot>> {
        let snapshots = self.snapshots.read().await;
        let mut found = snapshots.clone();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
