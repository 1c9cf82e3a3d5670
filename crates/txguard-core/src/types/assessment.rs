//! Factor results and risk assessments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason attached to the fail-closed assessment
pub const FAIL_SAFE_REASON: &str = "Risk calculation error";

/// Clamp a score into [0.0, 1.0] and round it to 4 decimal places.
///
/// NaN maps to 1.0 so that a broken computation never lowers risk.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 1.0;
    }
    let clamped = score.clamp(0.0, 1.0);
    (clamped * 10_000.0).round() / 10_000.0
}

/// One independently computed contribution to the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskFactor {
    Amount,
    Velocity,
    Geographic,
    Device,
    Behavioral,
}

impl RiskFactor {
    /// All factors in analyzer execution order
    pub const ALL: [RiskFactor; 5] = [
        RiskFactor::Amount,
        RiskFactor::Velocity,
        RiskFactor::Geographic,
        RiskFactor::Device,
        RiskFactor::Behavioral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::Amount => "amount",
            RiskFactor::Velocity => "velocity",
            RiskFactor::Geographic => "geographic",
            RiskFactor::Device => "device",
            RiskFactor::Behavioral => "behavioral",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a single analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorResult {
    /// Factor score in [0.0, 1.0] once finished
    pub score: f64,

    /// Human-readable contributing reasons, in rule order
    pub reasons: Vec<String>,

    /// A compliance hard stop fired; the aggregate is floored at the high threshold
    #[serde(default)]
    pub critical: bool,

    /// The analyzer could not complete normally and returned a penalty instead
    #[serde(default)]
    pub degraded: bool,
}

impl RiskFactorResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fired rule
    pub fn add(&mut self, points: f64, reason: impl Into<String>) {
        self.score += points;
        self.reasons.push(reason.into());
    }

    /// Add the penalty for a step that could not be completed
    pub fn add_degraded(&mut self, points: f64, reason: impl Into<String>) {
        self.add(points, reason);
        self.degraded = true;
    }

    pub fn mark_critical(&mut self) {
        self.critical = true;
    }

    /// Clamp the accumulated score
    pub fn finish(mut self) -> Self {
        self.score = clamp_score(self.score);
        self
    }

    pub fn is_clean(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Risk level derived from the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a score onto a level. Monotonic non-decreasing in `score`.
    pub fn from_score(score: f64, medium_threshold: f64, high_threshold: f64) -> Self {
        if score >= high_threshold {
            RiskLevel::High
        } else if score >= medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforcement action for the transaction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Proceed with the transfer
    Approve,

    /// Hold for manual review
    Review,

    /// Deny the transfer
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Approve => "APPROVE",
            Action::Review => "REVIEW",
            Action::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable, immutable result of scoring one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub transaction_id: String,
    pub user_id: String,
    pub score: f64,
    pub level: RiskLevel,

    /// Union of factor reasons in analyzer execution order
    pub reasons: Vec<String>,

    pub action: Action,
    pub requires_review: bool,
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    /// True for the fail-closed record produced when scoring could not be trusted
    pub fn is_fail_safe(&self) -> bool {
        self.reasons.len() == 1 && self.reasons[0] == FAIL_SAFE_REASON
    }
}
