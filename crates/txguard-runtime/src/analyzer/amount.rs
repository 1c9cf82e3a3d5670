//! Amount analyzer

use super::{AnalysisContext, RiskAnalyzer};
use crate::error::Result;
use async_trait::async_trait;
use txguard_core::{RiskFactor, RiskFactorResult};

const ROUND_AMOUNT_POINTS: f64 = 0.3;
const OVER_SINGLE_LIMIT_POINTS: f64 = 0.5;
const SMALL_AMOUNT_POINTS: f64 = 0.2;

/// Scores the transfer amount on its own
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountAnalyzer;

impl AmountAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RiskAnalyzer for AmountAnalyzer {
    fn factor(&self) -> RiskFactor {
        RiskFactor::Amount
    }

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<RiskFactorResult> {
        let amount = ctx.transaction.amount;
        let rules = &ctx.rules;
        let mut result = RiskFactorResult::new();

        if amount >= rules.round_amount_unit && amount % rules.round_amount_unit == 0.0 {
            result.add(ROUND_AMOUNT_POINTS, "Round number transaction");
        }

        if amount > rules.max_single_transaction {
            result.add(
                OVER_SINGLE_LIMIT_POINTS,
                "Amount exceeds single transaction limit",
            );
        }

        if amount < rules.small_amount_threshold {
            result.add(SMALL_AMOUNT_POINTS, "Very small transaction amount");
        }

        Ok(result.finish())
    }
}
