//! Classification outcome data structures

use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels from least to most severe
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Determine risk level from confidence and thresholds
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Configurable risk level thresholds; confidences below `medium` are Low
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Classifier decision for a single transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// 1-based arrival position within the batch
    sequence: usize,
    transaction: Transaction,
    is_fraud: bool,
    /// Probability that the transaction is fraudulent (0.0 - 1.0)
    confidence: f64,
    risk_level: RiskLevel,
}

impl ClassificationResult {
    pub fn new(transaction: Transaction, is_fraud: bool, confidence: f64, risk_level: RiskLevel) -> Self {
        Self {
            sequence: 1,
            transaction,
            is_fraud,
            confidence,
            risk_level,
        }
    }

    /// Set the arrival position within the batch
    pub(crate) fn with_sequence(mut self, sequence: usize) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Scored transaction
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Whether the confidence reached the classifier's threshold
    pub fn is_fraud(&self) -> bool {
        self.is_fraud
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Risk band of the confidence
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

/// Headline statistics for a processed batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_transactions: usize,
    pub fraud_count: usize,
    /// Share of flagged transactions, in percent
    pub fraud_rate: f64,
    pub processing_time_millis: u64,
}

impl BatchSummary {
    /// Summarize classified results
    pub fn from_results(results: &[ClassificationResult], processing_time_millis: u64) -> Self {
        let total_transactions = results.len();
        let fraud_count = results.iter().filter(|r| r.is_fraud).count();
        let fraud_rate = if total_transactions > 0 {
            (fraud_count as f64 / total_transactions as f64) * 100.0
        } else {
            0.0
        };

        Self {
            total_transactions,
            fraud_count,
            fraud_rate,
            processing_time_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(is_fraud: bool) -> ClassificationResult {
        let tx = Transaction::new(0.0, 10.0).unwrap();
        ClassificationResult::new(tx, is_fraud, if is_fraud { 0.9 } else { 0.1 }, RiskLevel::Low)
    }

    #[test]
    fn test_risk_level_from_score() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_score(0.1, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.5, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.75, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.95, &thresholds), RiskLevel::Critical);
    }

    #[test]
    fn test_result_exposes_read_only_view() {
        let tx = Transaction::new(3600.0, 1500.0).unwrap();
        let result = ClassificationResult::new(tx.clone(), true, 0.92, RiskLevel::Critical).with_sequence(7);

        assert_eq!(result.sequence(), 7);
        assert_eq!(result.transaction(), &tx);
        assert!(result.is_fraud());
        assert_eq!(result.confidence(), 0.92);
        assert_eq!(result.risk_level(), RiskLevel::Critical);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["risk_level"], "critical");
    }

    #[test]
    fn test_batch_summary() {
        let results = vec![result(true), result(false), result(false), result(true)];
        let summary = BatchSummary::from_results(&results, 42);

        assert_eq!(summary.total_transactions, 4);
        assert_eq!(summary.fraud_count, 2);
        assert!((summary.fraud_rate - 50.0).abs() < 1e-9);
        assert_eq!(summary.processing_time_millis, 42);
    }

    #[test]
    fn test_empty_summary_has_zero_rate() {
        let summary = BatchSummary::from_results(&[], 0);
        assert_eq!(summary.fraud_rate, 0.0);
    }
}
