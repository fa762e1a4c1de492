//! Classifier capability used by the pipeline

use crate::types::result::ClassificationResult;
use crate::types::transaction::Transaction;
use tracing::debug;

/// Scores a transaction as fraudulent or legitimate.
///
/// Implementations must be pure functions of their input: no hidden state is
/// mutated by `classify`, so a single instance can score a whole batch from
/// any thread. The returned confidence is the probability of fraud in
/// `[0, 1]`, and `is_fraud` must equal `confidence >= threshold()`.
pub trait Classifier: Send + Sync {
    /// Identifier used in logs and job reports
    fn name(&self) -> &str;

    /// Confidence at or above which a transaction is flagged
    fn threshold(&self) -> f64;

    /// Classify one transaction
    fn classify(&self, transaction: &Transaction) -> ClassificationResult;
}

/// Classify a batch, numbering results by arrival order (1-based)
pub fn classify_batch(
    classifier: &dyn Classifier,
    transactions: &[Transaction],
) -> Vec<ClassificationResult> {
    let results: Vec<ClassificationResult> = transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| classifier.classify(tx).with_sequence(i + 1))
        .collect();

    debug!(
        classifier = classifier.name(),
        count = results.len(),
        flagged = results.iter().filter(|r| r.is_fraud()).count(),
        "Batch classified"
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::RiskLevel;

    struct AmountOver(f64);

    impl Classifier for AmountOver {
        fn name(&self) -> &str {
            "amount_over"
        }

        fn threshold(&self) -> f64 {
            0.5
        }

        fn classify(&self, transaction: &Transaction) -> ClassificationResult {
            let confidence = if transaction.amount() > self.0 { 0.9 } else { 0.1 };
            ClassificationResult::new(
                transaction.clone(),
                confidence >= self.threshold(),
                confidence,
                RiskLevel::Low,
            )
        }
    }

    #[test]
    fn test_classify_batch_preserves_arrival_order() {
        let transactions: Vec<Transaction> = [5.0, 500.0, 50.0]
            .iter()
            .map(|&amount| Transaction::new(0.0, amount).unwrap())
            .collect();

        let results = classify_batch(&AmountOver(100.0), &transactions);

        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.sequence()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            results.iter().map(|r| r.is_fraud()).collect::<Vec<_>>(),
            vec![false, true, false]
        );
        assert_eq!(results[1].transaction().amount(), 500.0);
    }
}
