//! Type definitions for the scoring pipeline

pub mod result;
pub mod transaction;

pub use result::{BatchSummary, ClassificationResult, RiskLevel, RiskLevelThresholds};
pub use transaction::{Transaction, FEATURE_COUNT};
