//! A completed scoring job and its report

use crate::metrics::Metrics;
use crate::store::ResultStore;
use crate::types::result::{BatchSummary, RiskLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// How a job's transactions were submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Bulk,
    Manual,
}

/// One processed batch: results, metrics and summary, published together
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: SubmissionKind,
    /// Upload file name, or "manual entry"
    pub source: String,
    /// Name of the classifier that scored the batch
    pub classifier: String,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub metrics: Metrics,
    pub store: ResultStore,
}

impl Job {
    /// Status line shown to the user once the job has been published
    pub fn completion_message(&self) -> String {
        match self.kind {
            SubmissionKind::Bulk => format!(
                "Successfully processed {} transactions.",
                self.summary.total_transactions
            ),
            SubmissionKind::Manual => {
                let verdict = if self.summary.fraud_count > 0 {
                    "FRAUD DETECTED!"
                } else {
                    "Transaction appears normal."
                };
                format!("Transaction analyzed successfully. {}", verdict)
            }
        }
    }

    /// Count of results per confidence decile
    pub fn confidence_distribution(&self) -> [u64; 10] {
        let mut buckets = [0u64; 10];
        for r in self.store.results() {
            let bucket = (r.confidence() * 10.0).min(9.0) as usize;
            buckets[bucket] += 1;
        }
        buckets
    }

    /// Count of flagged results per risk level
    pub fn flagged_by_risk_level(&self) -> HashMap<RiskLevel, usize> {
        let mut by_level = HashMap::new();
        for r in self.store.results().iter().filter(|r| r.is_fraud()) {
            *by_level.entry(r.risk_level()).or_insert(0) += 1;
        }
        by_level
    }

    /// Log a summary report of the job
    pub fn log_report(&self) {
        let summary = &self.summary;
        let metrics = &self.metrics;
        let cm = &metrics.confusion_matrix;
        let basis = if metrics.is_estimated() {
            "estimated"
        } else {
            "ground truth"
        };

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             FRAUD SCORING JOB - RESULTS SUMMARY              ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Job: {}  ({})", self.id, self.source);
        info!(
            "║ Transactions: {:>8}  │  Flagged: {:>8}  │  Rate: {:>6.2}%",
            summary.total_transactions, summary.fraud_count, summary.fraud_rate
        );
        info!(
            "║ Processing Time: {} ms  │  Classifier: {}",
            summary.processing_time_millis, self.classifier
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Metrics ({}):", basis);
        info!(
            "║   accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            metrics.accuracy, metrics.precision, metrics.recall, metrics.f1_score
        );
        info!(
            "║   auc={:.4} specificity={:.4} fpr={:.4}",
            metrics.auc, metrics.specificity, metrics.false_positive_rate
        );
        info!(
            "║   TP={} FP={} TN={} FN={}",
            cm.true_positive(),
            cm.false_positive(),
            cm.true_negative(),
            cm.false_negative()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Flagged by Risk Level:");
        let by_level = self.flagged_by_risk_level();
        for level in RiskLevel::ALL {
            let count = by_level.get(&level).copied().unwrap_or(0);
            let pct = if summary.fraud_count > 0 {
                (count as f64 / summary.fraud_count as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)", format!("{:?}", level), count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Confidence Distribution:");
        let distribution = self.confidence_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsAggregator;
    use crate::types::result::ClassificationResult;
    use crate::types::transaction::Transaction;

    fn job(kind: SubmissionKind, confidences: &[f64]) -> Job {
        let results: Vec<ClassificationResult> = confidences
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let tx = Transaction::new(0.0, 10.0).unwrap();
                let level = if c >= 0.9 { RiskLevel::Critical } else { RiskLevel::Low };
                ClassificationResult::new(tx, c >= 0.5, c, level).with_sequence(i + 1)
            })
            .collect();
        let metrics = MetricsAggregator::default().aggregate(&results, None).unwrap();

        Job {
            id: Uuid::new_v4(),
            kind,
            source: "test.csv".to_string(),
            classifier: "test".to_string(),
            submitted_at: Utc::now(),
            completed_at: Utc::now(),
            summary: BatchSummary::from_results(&results, 5),
            metrics,
            store: ResultStore::new(results),
        }
    }

    #[test]
    fn test_completion_messages() {
        assert_eq!(
            job(SubmissionKind::Bulk, &[0.1, 0.2, 0.95]).completion_message(),
            "Successfully processed 3 transactions."
        );
        assert_eq!(
            job(SubmissionKind::Manual, &[0.92]).completion_message(),
            "Transaction analyzed successfully. FRAUD DETECTED!"
        );
        assert_eq!(
            job(SubmissionKind::Manual, &[0.2]).completion_message(),
            "Transaction analyzed successfully. Transaction appears normal."
        );
    }

    #[test]
    fn test_report_breakdowns() {
        let job = job(SubmissionKind::Bulk, &[0.05, 0.15, 0.55, 0.95, 1.0]);

        let distribution = job.confidence_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[1], 1);
        assert_eq!(distribution[5], 1);
        assert_eq!(distribution[9], 2);

        let by_level = job.flagged_by_risk_level();
        assert_eq!(by_level.get(&RiskLevel::Critical), Some(&2));
        assert_eq!(by_level.get(&RiskLevel::Low), Some(&1));

        job.log_report();
    }
}
