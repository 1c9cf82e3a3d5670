//! Time-bounded store wrapper
//!
//! Every call into the wrapped store is bounded by `tokio::time::timeout`.
//! An elapsed call surfaces as [`RuntimeError::StoreTimeout`]; there are no
//! retries.

use super::{AssessmentStore, ConfigSnapshot, HistoryEntry};
use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use txguard_core::RiskAssessment;

/// Default per-call budget
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// Store decorator that bounds every operation
pub struct TimedStore {
    inner: Arc<dyn AssessmentStore>,
    timeout: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn AssessmentStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Store operation '{}' exceeded {:?}",
                    operation,
                    self.timeout
                );
                Err(RuntimeError::StoreTimeout {
                    operation: operation.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[async_trait]
impl AssessmentStore for TimedStore {
    async fn save(&self, assessment: &RiskAssessment) -> Result<()> {
        self.bounded("save", self.inner.save(assessment)).await
    }

    async fn save_if_absent(&self, assessment: &RiskAssessment) -> Result<Option<RiskAssessment>> {
        self.bounded("save_if_absent", self.inner.save_if_absent(assessment))
            .await
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<RiskAssessment>> {
        self.bounded("get", self.inner.get(transaction_id)).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<RiskAssessment>> {
        self.bounded("list_by_user", self.inner.list_by_user(user_id))
            .await
    }

    async fn list_all(&self) -> Result<Vec<RiskAssessment>> {
        self.bounded("list_all", self.inner.list_all()).await
    }

    async fn append_transaction_history(
        &self,
        user_id: &str,
        entry: HistoryEntry,
        keep: usize,
    ) -> Result<()> {
        self.bounded(
            "append_transaction_history",
            self.inner.append_transaction_history(user_id, entry, keep),
        )
        .await
    }

    async fn get_recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        self.bounded(
            "get_recent_transactions",
            self.inner.get_recent_transactions(user_id, limit),
        )
        .await
    }

    async fn add_device_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<bool> {
        self.bounded(
            "add_device_fingerprint",
            self.inner.add_device_fingerprint(user_id, fingerprint),
        )
        .await
    }

    async fn count_devices(&self, user_id: &str) -> Result<usize> {
        self.bounded("count_devices", self.inner.count_devices(user_id))
            .await
    }

    async fn is_known_device(&self, user_id: &str, fingerprint: &str) -> Result<bool> {
        self.bounded(
            "is_known_device",
            self.inner.is_known_device(user_id, fingerprint),
        )
        .await
    }

    async fn save_config_snapshot(&self, snapshot: &ConfigSnapshot) -> Result<()> {
        self.bounded(
            "save_config_snapshot",
            self.inner.save_config_snapshot(snapshot),
        )
        .await
    }

    async fn list_config_snapshots(&self) -> Result<Vec<ConfigSnapshot>> {
        self.bounded("list_config_snapshots", self.inner.list_config_snapshots())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    /// Store whose history reads never finish in time
    struct StallingStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl AssessmentStore for StallingStore {
        async fn save(&self, assessment: &RiskAssessment) -> Result<()> {
            self.inner.save(assessment).await
        }
        async fn save_if_absent(
            &self,
            assessment: &RiskAssessment,
        ) -> Result<Option<RiskAssessment>> {
            self.inner.save_if_absent(assessment).await
        }
        async fn get(&self, transaction_id: &str) -> Result<Option<RiskAssessment>> {
            self.inner.get(transaction_id).await
        }
        async fn list_by_user(&self, user_id: &str) -> Result<Vec<RiskAssessment>> {
            self.inner.list_by_user(user_id).await
        }
        async fn list_all(&self) -> Result<Vec<RiskAssessment>> {
            self.inner.list_all().await
        }
        async fn append_transaction_history(
            &self,
            user_id: &str,
            entry: HistoryEntry,
            keep: usize,
        ) -> Result<()> {
            self.inner.append_transaction_history(user_id, entry, keep).await
        }
        async fn get_recent_transactions(
            &self,
            _user_id: &str,
            _limit: usize,
        ) -> Result<Vec<HistoryEntry>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
        async fn add_device_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<bool> {
            self.inner.add_device_fingerprint(user_id, fingerprint).await
        }
        async fn count_devices(&self, user_id: &str) -> Result<usize> {
            self.inner.count_devices(user_id).await
        }
        async fn is_known_device(&self, user_id: &str, fingerprint: &str) -> Result<bool> {
            self.inner.is_known_device(user_id, fingerprint).await
        }
        async fn save_config_snapshot(&self, snapshot: &ConfigSnapshot) -> Result<()> {
            self.inner.save_config_snapshot(snapshot).await
        }
        async fn list_config_snapshots(&self) -> Result<Vec<ConfigSnapshot>> {
            self.inner.list_config_snapshots().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let store = TimedStore::new(
            Arc::new(StallingStore {
                inner: InMemoryStore::new(),
            }),
            Duration::from_millis(50),
        );

        let err = store
            .get_recent_transactions("alice", 24)
            .await
            .unwrap_err();

        assert!(err.is_store_failure());
        assert!(matches!(
            err,
            RuntimeError::StoreTimeout { timeout_ms: 50, .. }
        ));
    }

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let store = TimedStore::new(Arc::new(InMemoryStore::new()), DEFAULT_STORE_TIMEOUT);

        assert!(store.add_device_fingerprint("alice", "fp").await.unwrap());
        assert_eq!(store.count_devices("alice").await.unwrap(), 1);
    }
}
