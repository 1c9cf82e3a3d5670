//! Velocity analyzer
//!
//! Reads the user's transaction history window and checks same-day totals,
//! same-day counts and short bursts inside a trailing window.

use super::{AnalysisContext, RiskAnalyzer};
use crate::error::Result;
use crate::storage::{AssessmentStore, HistoryEntry};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use txguard_core::{RiskFactor, RiskFactorResult};

const DAILY_AMOUNT_POINTS: f64 = 0.6;
const DAILY_COUNT_POINTS: f64 = 0.4;
const BURST_POINTS: f64 = 0.5;
const HISTORY_UNAVAILABLE_POINTS: f64 = 0.3;

/// Scores transaction frequency and volume for a user
pub struct VelocityAnalyzer {
    store: Arc<dyn AssessmentStore>,
}

impl VelocityAnalyzer {
    pub fn new(store: Arc<dyn AssessmentStore>) -> Self {
        Self { store }
    }
}

/// Same-day and trailing-window tallies over a history window
#[derive(Debug, Default, PartialEq)]
struct Tally {
    today_amount: f64,
    today_count: u32,
    window_count: u32,
}

fn tally(history: &[HistoryEntry], ctx: &AnalysisContext) -> Tally {
    let offset = *ctx.now.offset();
    let today: NaiveDate = ctx.now.date_naive();
    let now_utc = ctx.now_utc();
    let window_start = now_utc - Duration::minutes(i64::from(ctx.rules.velocity_window_minutes));

    let mut tally = Tally::default();
    for entry in history {
        if entry.timestamp.with_timezone(&offset).date_naive() == today {
            tally.today_amount += entry.amount;
            tally.today_count += 1;
        }
        if entry.timestamp > window_start && entry.timestamp <= now_utc {
            tally.window_count += 1;
        }
    }
    tally
}

#[async_trait]
impl RiskAnalyzer for VelocityAnalyzer {
    fn factor(&self) -> RiskFactor {
        RiskFactor::Velocity
    }

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<RiskFactorResult> {
        let user_id = &ctx.transaction.user_id;
        let rules = &ctx.rules;
        let mut result = RiskFactorResult::new();

        let history = match self
            .store
            .get_recent_transactions(user_id, rules.history_limit as usize)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Transaction history unavailable for user {}: {}", user_id, e);
                result.add_degraded(
                    HISTORY_UNAVAILABLE_POINTS,
                    "Unable to verify transaction history",
                );
                return Ok(result.finish());
            }
        };

        let tally = tally(&history, ctx);
        tracing::debug!(
            "Velocity for user {}: today {} / {:.2}, window {}",
            user_id,
            tally.today_count,
            tally.today_amount,
            tally.window_count
        );

        if tally.today_amount + ctx.transaction.amount > rules.max_daily_amount {
            result.add(DAILY_AMOUNT_POINTS, "Daily amount limit exceeded");
        }

        if tally.today_count >= rules.max_daily_transactions {
            result.add(DAILY_COUNT_POINTS, "Daily transaction limit exceeded");
        }

        if tally.window_count > rules.velocity_max_transactions {
            result.add(BURST_POINTS, "High transaction velocity detected");
        }

        Ok(result.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::context;
    use crate::storage::InMemoryStore;
    use chrono::Utc;
    use txguard_core::TransactionInput;

    async fn seed(store: &InMemoryStore, ctx: &AnalysisContext, entries: &[(f64, i64)]) {
        for (amount, minutes_ago) in entries {
            let at = ctx.now_utc() - Duration::minutes(*minutes_ago);
            store
                .append_transaction_history("alice", HistoryEntry::new(*amount, at), 24)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_no_history_is_clean() {
        let ctx = context(TransactionInput::new("tx", "alice", 500.0));
        let analyzer = VelocityAnalyzer::new(Arc::new(InMemoryStore::new()));

        let result = analyzer.analyze(&ctx).await.unwrap();
        assert!(result.is_clean());
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_burst_inside_window() {
        let ctx = context(TransactionInput::new("tx", "alice", 50.0));
        let store = InMemoryStore::new();
        seed(&store, &ctx, &[(20.0, 5), (20.0, 15), (20.0, 30), (20.0, 45)]).await;

        let result = VelocityAnalyzer::new(Arc::new(store))
            .analyze(&ctx)
            .await
            .unwrap();
        assert_eq!(result.reasons, vec!["High transaction velocity detected"]);
        assert_eq!(result.score, 0.5);
    }

    #[tokio::test]
    async fn test_three_in_window_is_not_a_burst() {
        let ctx = context(TransactionInput::new("tx", "alice", 50.0));
        let store = InMemoryStore::new();
        // Fourth entry is outside the 60 minute window
        seed(&store, &ctx, &[(20.0, 5), (20.0, 15), (20.0, 30), (20.0, 90)]).await;

        let result = VelocityAnalyzer::new(Arc::new(store))
            .analyze(&ctx)
            .await
            .unwrap();
        assert!(result.is_clean());
    }

    #[tokio::test]
    async fn test_daily_amount_and_count() {
        // 14:00 local; entries spread over the morning
        let ctx = context(TransactionInput::new("tx", "alice", 6_000.0));
        let store = InMemoryStore::new();
        let entries: Vec<(f64, i64)> = (0..10).map(|i| (4_500.0, 120 + i * 30)).collect();
        seed(&store, &ctx, &entries).await;

        let result = VelocityAnalyzer::new(Arc::new(store))
            .analyze(&ctx)
            .await
            .unwrap();
        assert_eq!(
            result.reasons,
            vec![
                "Daily amount limit exceeded",
                "Daily transaction limit exceeded"
            ]
        );
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_yesterday_does_not_count() {
        let ctx = context(TransactionInput::new("tx", "alice", 100.0));
        let store = InMemoryStore::new();
        // 15 hours ago is 23:00 the previous day
        seed(&store, &ctx, &[(49_990.0, 15 * 60)]).await;

        let result = VelocityAnalyzer::new(Arc::new(store))
            .analyze(&ctx)
            .await
            .unwrap();
        assert!(result.is_clean());
    }

    #[test]
    fn test_tally_uses_local_calendar_day() {
        let ctx = crate::analyzer::test_support::context_at(
            "2024-03-15T00:30:00+02:00",
            TransactionInput::new("tx", "alice", 1.0),
        );
        // 22:15 UTC on the 14th is 00:15 on the 15th at +02:00
        let history = vec![HistoryEntry::new(
            10.0,
            "2024-03-14T22:15:00Z".parse::<chrono::DateTime<Utc>>().unwrap(),
        )];

        let tally = tally(&history, &ctx);
        assert_eq!(tally.today_count, 1);
        assert_eq!(tally.window_count, 1);
    }
}
