//! Feature extraction for transaction scoring.
//!
//! Turns a validated [`Transaction`] into the derived quantities the
//! heuristic signals are computed from.

use crate::types::transaction::Transaction;

const SECONDS_PER_HOUR: f64 = 3600.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Derived features for one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFeatures {
    /// `ln(1 + amount)`
    pub log_amount: f64,
    /// Hour of day in `[0, 24)`, assuming the dataset clock starts at midnight
    pub hour_of_day: f64,
    /// Mean absolute value over the anonymized features that are present
    pub feature_magnitude: Option<f64>,
    /// Number of anonymized features present
    pub present_features: usize,
}

/// Feature extractor that transforms transactions into signal inputs.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a transaction.
    pub fn extract(&self, tx: &Transaction) -> TransactionFeatures {
        let log_amount = tx.amount().ln_1p();
        let hour_of_day = (tx.time() / SECONDS_PER_HOUR).rem_euclid(HOURS_PER_DAY);

        let (sum_abs, present_features) = tx
            .present_features()
            .fold((0.0, 0usize), |(sum, n), v| (sum + v.abs(), n + 1));
        let feature_magnitude = (present_features > 0).then(|| sum_abs / present_features as f64);

        TransactionFeatures {
            log_amount,
            hour_of_day,
            feature_magnitude,
            present_features,
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_extraction() {
        let extractor = FeatureExtractor::new();
        let tx = Transaction::with_features(
            3.5 * 3600.0 + 86_400.0,
            99.0,
            vec![Some(-2.0), None, Some(1.0)],
        )
        .unwrap();

        let features = extractor.extract(&tx);

        assert!((features.log_amount - 100f64.ln()).abs() < 1e-12);
        assert!((features.hour_of_day - 3.5).abs() < 1e-9);
        assert_eq!(features.feature_magnitude, Some(1.5));
        assert_eq!(features.present_features, 2);
    }

    #[test]
    fn test_no_features_present() {
        let extractor = FeatureExtractor::new();
        let tx = Transaction::new(0.0, 0.0).unwrap();

        let features = extractor.extract(&tx);

        assert_eq!(features.log_amount, 0.0);
        assert_eq!(features.feature_magnitude, None);
        assert_eq!(features.present_features, 0);
    }
}
