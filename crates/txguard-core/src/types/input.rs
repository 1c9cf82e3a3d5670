//! Scoring inputs
//!
//! Snapshots handed in by the transaction pipeline. The engine reads them and
//! never mutates them.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending money transfer submitted for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    /// Caller-supplied unique identifier
    pub transaction_id: String,

    /// Sending user
    pub user_id: String,

    /// Positive amount in the transaction currency
    pub amount: f64,

    #[serde(default)]
    pub currency: String,

    /// ISO 3166-1 alpha-2 code of the recipient
    #[serde(default)]
    pub recipient_country: String,

    #[serde(default)]
    pub kyc_verified: bool,
}

impl TransactionInput {
    /// Create a new transaction input
    pub fn new(
        transaction_id: impl Into<String>,
        user_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            user_id: user_id.into(),
            amount,
            currency: "USD".to_string(),
            recipient_country: String::new(),
            kyc_verified: false,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_recipient_country(mut self, country: impl Into<String>) -> Self {
        self.recipient_country = country.into();
        self
    }

    pub fn with_kyc_verified(mut self, verified: bool) -> Self {
        self.kyc_verified = verified;
        self
    }

    /// Reject input no score can be trusted for
    pub fn validate(&self) -> Result<()> {
        if self.transaction_id.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "transaction id must not be empty".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "user id must not be empty".to_string(),
            ));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CoreError::InvalidValue {
                field: "amount".to_string(),
                reason: format!("expected a positive finite number, got {}", self.amount),
            });
        }
        Ok(())
    }
}

/// User's home location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub country: String,
}

/// Read-only user snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,

    #[serde(default)]
    pub location: Option<Location>,

    /// Account creation time; `None` when the pipeline could not resolve it
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            location: None,
            created_at: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.location = Some(Location {
            country: country.into(),
        });
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Home country, if known
    pub fn country(&self) -> Option<&str> {
        self.location
            .as_ref()
            .map(|l| l.country.as_str())
            .filter(|c| !c.is_empty())
    }
}

/// Observable attributes of the reporting device
///
/// Missing fields deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceContext {
    pub user_agent: String,
    pub ip: String,
    pub screen_resolution: String,
    pub timezone: String,
    pub language: String,
}

impl DeviceContext {
    pub fn new(user_agent: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ip: ip.into(),
            ..Default::default()
        }
    }

    pub fn with_screen_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.screen_resolution = resolution.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}
