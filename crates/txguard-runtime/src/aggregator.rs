//! Risk aggregation
//!
//! Runs every analyzer concurrently against one [`AnalysisContext`], combines
//! their scores with fixed weights and derives the risk level. Any fatal
//! analyzer error, or a panic inside an analyzer task, resolves the whole
//! evaluation to the fail-closed score.

use crate::analyzer::{
    AmountAnalyzer, AnalysisContext, BehavioralAnalyzer, DeviceAnalyzer, GeographicAnalyzer,
    RiskAnalyzer, VelocityAnalyzer,
};
use crate::error::{Result, RuntimeError};
use crate::storage::AssessmentStore;
use futures::future::join_all;
use std::sync::Arc;
use txguard_core::{
    clamp_score, CoreError, RiskFactor, RiskFactorResult, RiskLevel, FAIL_SAFE_REASON,
};

/// Per-factor weights; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    pub amount: f64,
    pub velocity: f64,
    pub geographic: f64,
    pub device: f64,
    pub behavioral: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            amount: 0.20,
            velocity: 0.25,
            geographic: 0.15,
            device: 0.20,
            behavioral: 0.20,
        }
    }
}

impl FactorWeights {
    pub fn weight(&self, factor: RiskFactor) -> f64 {
        match factor {
            RiskFactor::Amount => self.amount,
            RiskFactor::Velocity => self.velocity,
            RiskFactor::Geographic => self.geographic,
            RiskFactor::Device => self.device,
            RiskFactor::Behavioral => self.behavioral,
        }
    }

    pub fn sum(&self) -> f64 {
        RiskFactor::ALL.iter().map(|f| self.weight(*f)).sum()
    }
}

/// Combined output of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScore {
    pub score: f64,
    pub level: RiskLevel,

    /// Factor reasons concatenated in factor order
    pub reasons: Vec<String>,

    /// Individual factor results in factor order; empty for the fail-safe score
    pub factors: Vec<(RiskFactor, RiskFactorResult)>,
}

impl AggregateScore {
    /// The fail-closed score: maximum risk with a single generic reason
    pub fn fail_safe() -> Self {
        Self {
            score: 1.0,
            level: RiskLevel::High,
            reasons: vec![FAIL_SAFE_REASON.to_string()],
            factors: Vec::new(),
        }
    }

    pub fn is_fail_safe(&self) -> bool {
        self.factors.is_empty() && self.reasons.len() == 1 && self.reasons[0] == FAIL_SAFE_REASON
    }

    /// Factors that fell back to their degraded penalty
    pub fn degraded_factors(&self) -> impl Iterator<Item = RiskFactor> + '_ {
        self.factors
            .iter()
            .filter(|(_, result)| result.degraded)
            .map(|(factor, _)| *factor)
    }
}

/// Runs the analyzers and combines their scores
pub struct RiskAggregator {
    analyzers: Vec<Arc<dyn RiskAnalyzer>>,
    weights: FactorWeights,
}

impl RiskAggregator {
    /// Create an aggregator with the five built-in analyzers over `store`
    pub fn new(store: Arc<dyn AssessmentStore>) -> Self {
        Self {
            analyzers: vec![
                Arc::new(AmountAnalyzer::new()),
                Arc::new(VelocityAnalyzer::new(store.clone())),
                Arc::new(GeographicAnalyzer::new()),
                Arc::new(DeviceAnalyzer::new(store)),
                Arc::new(BehavioralAnalyzer::new()),
            ],
            weights: FactorWeights::default(),
        }
    }

    /// Create an aggregator from custom analyzers, one per factor
    pub fn with_analyzers(analyzers: Vec<Arc<dyn RiskAnalyzer>>) -> Result<Self> {
        for factor in RiskFactor::ALL {
            let count = analyzers.iter().filter(|a| a.factor() == factor).count();
            if count != 1 {
                return Err(RuntimeError::InvalidAnalyzers(format!(
                    "expected exactly one {} analyzer, found {}",
                    factor, count
                )));
            }
        }

        let mut analyzers = analyzers;
        analyzers.sort_by_key(|a| a.factor());
        Ok(Self {
            analyzers,
            weights: FactorWeights::default(),
        })
    }

    pub fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    /// Evaluate a transaction, failing closed on any fatal error
    pub async fn evaluate(&self, ctx: AnalysisContext) -> AggregateScore {
        let transaction_id = ctx.transaction.transaction_id.clone();
        match self.try_evaluate(ctx).await {
            Ok(aggregate) => aggregate,
            Err(e) => {
                tracing::error!(
                    "Risk calculation failed for transaction {}: {}",
                    transaction_id,
                    e
                );
                AggregateScore::fail_safe()
            }
        }
    }

    /// Evaluate a transaction, surfacing the first fatal error
    pub async fn try_evaluate(&self, ctx: AnalysisContext) -> Result<AggregateScore> {
        ctx.transaction.validate()?;
        if ctx.user.user_id != ctx.transaction.user_id {
            return Err(CoreError::InvalidInput(format!(
                "user context '{}' does not match transaction user '{}'",
                ctx.user.user_id, ctx.transaction.user_id
            ))
            .into());
        }

        let ctx = Arc::new(ctx);
        let tasks = self.analyzers.iter().map(|analyzer| {
            let analyzer = analyzer.clone();
            let ctx = ctx.clone();
            let factor = analyzer.factor();
            let handle = tokio::spawn(async move { analyzer.analyze(&ctx).await });
            async move { (factor, handle.await) }
        });

        let mut factors = Vec::with_capacity(self.analyzers.len());
        for (factor, joined) in join_all(tasks).await {
            let result = joined.map_err(|e| RuntimeError::AnalyzerFailed {
                factor,
                message: e.to_string(),
            })??;
            factors.push((factor, result));
        }

        Ok(self.combine(factors, &ctx))
    }

    fn combine(
        &self,
        factors: Vec<(RiskFactor, RiskFactorResult)>,
        ctx: &AnalysisContext,
    ) -> AggregateScore {
        let rules = &ctx.rules;

        let mut score: f64 = factors
            .iter()
            .map(|(factor, result)| self.weights.weight(*factor) * clamp_score(result.score))
            .sum();

        if factors.iter().any(|(_, result)| result.critical) {
            score = score.max(rules.high_risk_threshold);
        }

        let score = clamp_score(score);
        let level =
            RiskLevel::from_score(score, rules.medium_risk_threshold, rules.high_risk_threshold);
        let reasons = factors
            .iter()
            .flat_map(|(_, result)| result.reasons.iter().cloned())
            .collect();

        tracing::debug!(
            "Transaction {} scored {:.4} ({})",
            ctx.transaction.transaction_id,
            score,
            level
        );

        AggregateScore {
            score,
            level,
            reasons,
            factors,
        }
    }
}
