//! Factor analyzers
//!
//! Five independent evaluators, one per [`RiskFactor`]:
//! - `amount`: round numbers, single-transaction limit, tiny amounts
//! - `velocity`: same-day totals and counts, trailing-window bursts
//! - `geographic`: recipient country lists, user home country
//! - `device`: device set size, new devices, bot agents, private IPs
//! - `behavioral`: time of day, account age, KYC on large amounts
//!
//! An analyzer that cannot finish its normal computation returns a degraded
//! result with a penalty and a reason. It returns `Err` only for conditions no
//! partial score can be trusted for; the aggregator fails closed on those.

mod amount;
mod behavioral;
mod device;
mod geographic;
mod velocity;

pub use amount::AmountAnalyzer;
pub use behavioral::BehavioralAnalyzer;
pub use device::{is_bot_user_agent, is_private_ip, DeviceAnalyzer};
pub use geographic::GeographicAnalyzer;
pub use velocity::VelocityAnalyzer;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use txguard_core::{
    DeviceContext, RiskFactor, RiskFactorResult, RuleConfig, TransactionInput, UserContext,
};

/// Everything an analyzer may look at for one transaction
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub transaction: TransactionInput,
    pub user: UserContext,
    pub device: DeviceContext,

    /// Fingerprint derived from `device`
    pub fingerprint: String,

    /// Evaluation time in the caller's local offset
    pub now: DateTime<FixedOffset>,

    /// Rule snapshot taken when the assessment started
    pub rules: Arc<RuleConfig>,
}

impl AnalysisContext {
    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }
}

/// A pluggable scoring back end for one factor
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    /// The factor this analyzer scores; selects its weight
    fn factor(&self) -> RiskFactor;

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<RiskFactorResult>;
}
