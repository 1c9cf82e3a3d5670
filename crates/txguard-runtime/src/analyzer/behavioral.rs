//! Behavioral analyzer

use super::{AnalysisContext, RiskAnalyzer};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Timelike;
use txguard_core::{RiskFactor, RiskFactorResult};

const SUSPICIOUS_HOUR_POINTS: f64 = 0.3;
const NEW_ACCOUNT_POINTS: f64 = 0.4;
const UNVERIFIED_LARGE_AMOUNT_POINTS: f64 = 0.5;
const ACCOUNT_AGE_UNKNOWN_POINTS: f64 = 0.2;

/// Scores time of day, account age and KYC status
#[derive(Debug, Clone, Copy, Default)]
pub struct BehavioralAnalyzer;

impl BehavioralAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RiskAnalyzer for BehavioralAnalyzer {
    fn factor(&self) -> RiskFactor {
        RiskFactor::Behavioral
    }

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<RiskFactorResult> {
        let rules = &ctx.rules;
        let tx = &ctx.transaction;
        let mut result = RiskFactorResult::new();

        if rules.is_suspicious_hour(ctx.now.hour()) {
            result.add(
                SUSPICIOUS_HOUR_POINTS,
                "Transaction during suspicious time window",
            );
        }

        match ctx.user.created_at {
            Some(created_at) => {
                let age = ctx.now_utc() - created_at;
                if age < chrono::Duration::days(i64::from(rules.new_account_days)) {
                    result.add(
                        NEW_ACCOUNT_POINTS,
                        format!("New account (less than {} days old)", rules.new_account_days),
                    );
                }
            }
            None => {
                tracing::warn!("No account creation time for user {}", tx.user_id);
                result.add_degraded(ACCOUNT_AGE_UNKNOWN_POINTS, "Unable to verify user behavior");
            }
        }

        if tx.amount > rules.kyc_required_amount && !tx.kyc_verified {
            result.add(
                UNVERIFIED_LARGE_AMOUNT_POINTS,
                "Large transaction without KYC verification",
            );
        }

        Ok(result.finish())
    }
}
