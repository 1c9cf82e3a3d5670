//! RiskEngine - Main API for scoring transactions
//!
//! - `types`: request and history query types
//! - `engine`: the engine itself

mod engine;
mod types;

pub use engine::RiskEngine;
pub use types::{AssessmentRequest, HistoryQuery};
