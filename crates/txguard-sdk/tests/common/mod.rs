//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use txguard_runtime::{
    fingerprint, AssessmentStore, Clock, ConfigSnapshot, FixedClock, HistoryEntry, InMemoryStore,
    RuntimeError,
};
use txguard_sdk::{
    Action, DeviceContext, RiskAssessment, RiskEngine, RiskEngineBuilder, RiskLevel,
    TransactionInput, UserContext,
};

/// Friday 14:00 UTC, outside the suspicious window
pub const AFTERNOON: &str = "2024-03-15T14:00:00+00:00";

/// Engine wired to a shared in-memory store and a manual clock
pub struct TestEngine {
    pub engine: RiskEngine,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
}

impl TestEngine {
    pub fn at(rfc3339: &str) -> Self {
        let clock = Arc::new(FixedClock::at(rfc3339).expect("valid timestamp"));
        let store = Arc::new(InMemoryStore::new().with_clock(clock.clone()));
        let engine = RiskEngineBuilder::new()
            .with_store(store.clone())
            .with_clock(clock.clone())
            .build()
            .expect("engine builds");
        Self {
            engine,
            store,
            clock,
        }
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    /// Mark `device` as already seen for `user_id`
    pub async fn register_device(&self, user_id: &str, device: &DeviceContext) {
        self.store
            .add_device_fingerprint(user_id, &fingerprint(device))
            .await
            .unwrap();
    }

    /// Record a past transfer `minutes_ago` before the clock's current time
    pub async fn seed_history(&self, user_id: &str, amount: f64, minutes_ago: i64) {
        let at = self.now_utc() - Duration::minutes(minutes_ago);
        self.store
            .append_transaction_history(user_id, HistoryEntry::new(amount, at), 24)
            .await
            .unwrap();
    }

    pub async fn assess(
        &self,
        transaction: TransactionInput,
        user: UserContext,
        device: DeviceContext,
    ) -> RiskAssessment {
        self.engine.assess(transaction, user, device).await
    }
}

/// Engine over a store that fails every call
pub fn unavailable_engine(rfc3339: &str) -> RiskEngine {
    let clock = Arc::new(FixedClock::at(rfc3339).expect("valid timestamp"));
    RiskEngineBuilder::new()
        .with_store(Arc::new(UnavailableStore))
        .with_clock(clock)
        .build()
        .expect("engine builds")
}

/// KYC-verified domestic transfer
pub fn transfer(transaction_id: &str, user_id: &str, amount: f64) -> TransactionInput {
    TransactionInput::new(transaction_id, user_id, amount)
        .with_recipient_country("US")
        .with_kyc_verified(true)
}

/// US user whose account is 30 days old at `now`
pub fn established_user(user_id: &str, now: DateTime<Utc>) -> UserContext {
    UserContext::new(user_id)
        .with_country("US")
        .with_created_at(now - Duration::days(30))
}

pub fn browser() -> DeviceContext {
    DeviceContext::new(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15",
        "198.51.100.23",
    )
    .with_screen_resolution("2560x1440")
    .with_timezone("America/New_York")
    .with_language("en-US")
}

/// Store whose backing service is down
pub struct UnavailableStore;

fn down<T>() -> txguard_runtime::Result<T> {
    Err(RuntimeError::StoreUnavailable("connection refused".to_string()))
}

#[async_trait]
impl AssessmentStore for UnavailableStore {
    async fn save(&self, _assessment: &RiskAssessment) -> txguard_runtime::Result<()> {
        down()
    }
    async fn save_if_absent(
        &self,
        _assessment: &RiskAssessment,
    ) -> txguard_runtime::Result<Option<RiskAssessment>> {
        down()
    }
    async fn get(&self, _transaction_id: &str) -> txguard_runtime::Result<Option<RiskAssessment>> {
        down()
    }
    async fn list_by_user(&self, _user_id: &str) -> txguard_runtime::Result<Vec<RiskAssessment>> {
        down()
    }
    async fn list_all(&self) -> txguard_runtime::Result<Vec<RiskAssessment>> {
        down()
    }
    async fn append_transaction_history(
        &self,
        _user_id: &str,
        _entry: HistoryEntry,
        _keep: usize,
    ) -> txguard_runtime::Result<()> {
        down()
    }
    async fn get_recent_transactions(
        &self,
        _user_id: &str,
        _limit: usize,
    ) -> txguard_runtime::Result<Vec<HistoryEntry>> {
        down()
    }
    async fn add_device_fingerprint(
        &self,
        _user_id: &str,
        _fingerprint: &str,
    ) -> txguard_runtime::Result<bool> {
        down()
    }
    async fn count_devices(&self, _user_id: &str) -> txguard_runtime::Result<usize> {
        down()
    }
    async fn is_known_device(
        &self,
        _user_id: &str,
        _fingerprint: &str,
    ) -> txguard_runtime::Result<bool> {
        down()
    }
    async fn save_config_snapshot(
        &self,
        _snapshot: &ConfigSnapshot,
    ) -> txguard_runtime::Result<()> {
        down()
    }
    async fn list_config_snapshots(&self) -> txguard_runtime::Result<Vec<ConfigSnapshot>> {
        down()
    }
}

/// Assertion helpers for assessments
pub trait AssessmentAssertions {
    fn assert_action(&self, expected: Action);
    fn assert_level(&self, expected: RiskLevel);
    fn assert_score(&self, expected: f64);
    fn assert_has_reason(&self, reason: &str);
    fn assert_lacks_reason(&self, reason: &str);
}

impl AssessmentAssertions for RiskAssessment {
    fn assert_action(&self, expected: Action) {
        assert_eq!(
            self.action, expected,
            "Expected action {}, got {} (reasons: {:?})",
            expected, self.action, self.reasons
        );
    }

    fn assert_level(&self, expected: RiskLevel) {
        assert_eq!(
            self.level, expected,
            "Expected level {}, got {} (score {})",
            expected, self.level, self.score
        );
    }

    fn assert_score(&self, expected: f64) {
        assert!(
            (self.score - expected).abs() < 1e-9,
            "Expected score {}, got {} (reasons: {:?})",
            expected,
            self.score,
            self.reasons
        );
    }

    fn assert_has_reason(&self, reason: &str) {
        assert!(
            self.reasons.iter().any(|r| r == reason),
            "Expected reason '{}' in {:?}",
            reason,
            self.reasons
        );
    }

    fn assert_lacks_reason(&self, reason: &str) {
        assert!(
            !self.reasons.iter().any(|r| r == reason),
            "Unexpected reason '{}' in {:?}",
            reason,
            self.reasons
        );
    }
}
