//! Request and query types for RiskEngine

use serde::{Deserialize, Serialize};
use txguard_core::{DeviceContext, TransactionInput, UserContext};

/// One scoring request as submitted by the transaction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub transaction: TransactionInput,
    pub user: UserContext,
    #[serde(default)]
    pub device: DeviceContext,
}

impl AssessmentRequest {
    pub fn new(transaction: TransactionInput, user: UserContext, device: DeviceContext) -> Self {
        Self {
            transaction,
            user,
            device,
        }
    }
}

/// Filter for assessment history lookups
///
/// With a transaction id the result holds at most that one assessment (and is
/// empty if it belongs to a different user than `user_id`). With only a user id
/// it holds that user's assessments. With neither it holds everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryQuery {
    pub user_id: Option<String>,
    pub transaction_id: Option<String>,
}

impl HistoryQuery {
    /// Every unexpired assessment
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            transaction_id: None,
        }
    }

    pub fn for_transaction(transaction_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            transaction_id: Some(transaction_id.into()),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
