//! Geographic analyzer

use super::{AnalysisContext, RiskAnalyzer};
use crate::error::Result;
use async_trait::async_trait;
use txguard_core::{RiskFactor, RiskFactorResult};

const DISALLOWED_RECIPIENT_POINTS: f64 = 0.8;
const HIGH_RISK_RECIPIENT_POINTS: f64 = 0.4;
const FOREIGN_USER_POINTS: f64 = 0.3;

/// Scores recipient country and user location against the country sets
#[derive(Debug, Clone, Copy, Default)]
pub struct GeographicAnalyzer;

impl GeographicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RiskAnalyzer for GeographicAnalyzer {
    fn factor(&self) -> RiskFactor {
        RiskFactor::Geographic
    }

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<RiskFactorResult> {
        let rules = &ctx.rules;
        let recipient = ctx.transaction.recipient_country.as_str();
        let mut result = RiskFactorResult::new();

        if !rules.is_allowed_country(recipient) {
            result.add(
                DISALLOWED_RECIPIENT_POINTS,
                "Recipient country not in allowed list",
            );
            // Sending outside the corridor list is a hard stop
            result.mark_critical();
        }

        if rules.is_high_risk_country(recipient) {
            result.add(HIGH_RISK_RECIPIENT_POINTS, "High-risk recipient country");
        }

        if let Some(country) = ctx.user.country() {
            if !country.eq_ignore_ascii_case(rules.primary_country.trim()) {
                result.add(FOREIGN_USER_POINTS, "User location outside primary country");
            }
        }

        Ok(result.finish())
    }
}
