//! Decision mapping from risk level to enforcement action

use serde::{Deserialize, Serialize};
use txguard_core::{Action, RiskLevel};

/// Enforcement outcome for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: Action,
    pub requires_review: bool,
}

/// Map a level to its action. Pure, no I/O.
pub fn decide(level: RiskLevel) -> Decision {
    match level {
        RiskLevel::High => Decision {
            action: Action::Block,
            requires_review: true,
        },
        RiskLevel::Medium => Decision {
            action: Action::Review,
            requires_review: true,
        },
        RiskLevel::Low => Decision {
            action: Action::Approve,
            requires_review: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table() {
        assert_eq!(
            decide(RiskLevel::High),
            Decision {
                action: Action::Block,
                requires_review: true
            }
        );
        assert_eq!(
            decide(RiskLevel::Medium),
            Decision {
                action: Action::Review,
                requires_review: true
            }
        );
        assert_eq!(
            decide(RiskLevel::Low),
            Decision {
                action: Action::Approve,
                requires_review: false
            }
        );
    }
}
