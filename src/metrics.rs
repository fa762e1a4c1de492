//! Classification-quality metrics for a scored batch.
//!
//! The confusion matrix is derived from real outcomes only: predicted flags
//! compared against ground truth when the batch is labeled, or
//! confidence-weighted expected counts when it is not (and the label policy
//! allows estimation).

use crate::config::LabelPolicy;
use crate::error::{PipelineError, Result};
use crate::types::result::ClassificationResult;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// Prediction-vs-truth counts for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    true_positive: u64,
    false_positive: u64,
    true_negative: u64,
    false_negative: u64,
}

impl ConfusionMatrix {
    fn from_counts(true_positive: u64, false_positive: u64, true_negative: u64, false_negative: u64) -> Self {
        Self {
            true_positive,
            false_positive,
            true_negative,
            false_negative,
        }
    }

    pub fn true_positive(&self) -> u64 {
        self.true_positive
    }

    pub fn false_positive(&self) -> u64 {
        self.false_positive
    }

    pub fn true_negative(&self) -> u64 {
        self.true_negative
    }

    pub fn false_negative(&self) -> u64 {
        self.false_negative
    }

    /// Number of results the matrix was derived from
    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Whether metrics describe real labels or an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsBasis {
    GroundTruth,
    Estimated,
}

/// Derived classification-quality metrics. Every value lies in `[0, 1]`;
/// undefined ratios are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc: f64,
    pub specificity: f64,
    pub false_positive_rate: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub basis: MetricsBasis,
}

impl Metrics {
    fn from_matrix(cm: ConfusionMatrix, auc: f64, basis: MetricsBasis) -> Self {
        let tp = cm.true_positive as f64;
        let fp = cm.false_positive as f64;
        let tn = cm.true_negative as f64;
        let fn_ = cm.false_negative as f64;

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);

        Self {
            accuracy: ratio(tp + tn, tp + fp + tn + fn_),
            precision,
            recall,
            f1_score: ratio(2.0 * precision * recall, precision + recall),
            auc,
            specificity: ratio(tn, tn + fp),
            false_positive_rate: ratio(fp, fp + tn),
            confusion_matrix: cm,
            basis,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.basis == MetricsBasis::Estimated
    }
}

/// Computes confusion matrices and metrics under a label policy
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    policy: LabelPolicy,
}

impl MetricsAggregator {
    pub fn new(policy: LabelPolicy) -> Self {
        Self { policy }
    }

    /// Derive the confusion matrix and metrics for a batch.
    ///
    /// `ground_truth[i]` is the true label of `results[i]`.
    pub fn aggregate(
        &self,
        results: &[ClassificationResult],
        ground_truth: Option<&[bool]>,
    ) -> Result<Metrics> {
        validate(results, ground_truth)?;

        let metrics = match ground_truth {
            Some(labels) => {
                let cm = labeled_matrix(results, labels);
                let auc = weighted_auc(
                    results
                        .iter()
                        .zip(labels)
                        .map(|(r, &label)| (r.confidence(), if label { 1.0 } else { 0.0 })),
                );
                Metrics::from_matrix(cm, auc, MetricsBasis::GroundTruth)
            }
            None => match self.policy {
                LabelPolicy::Require => return Err(PipelineError::LabelsRequired),
                LabelPolicy::Estimate => {
                    let cm = estimated_matrix(results);
                    let auc = weighted_auc(results.iter().map(|r| (r.confidence(), r.confidence())));
                    Metrics::from_matrix(cm, auc, MetricsBasis::Estimated)
                }
            },
        };

        debug!(
            basis = ?metrics.basis,
            tp = metrics.confusion_matrix.true_positive,
            fp = metrics.confusion_matrix.false_positive,
            tn = metrics.confusion_matrix.true_negative,
            fn_ = metrics.confusion_matrix.false_negative,
            accuracy = metrics.accuracy,
            "Metrics aggregated"
        );

        Ok(metrics)
    }
}

fn validate(results: &[ClassificationResult], ground_truth: Option<&[bool]>) -> Result<()> {
    if results.is_empty() {
        return Err(PipelineError::invalid_metric("batch is empty"));
    }

    for r in results {
        if !(0.0..=1.0).contains(&r.confidence()) {
            return Err(PipelineError::invalid_metric(format!(
                "result {}: confidence {} is outside [0, 1]",
                r.sequence(), r.confidence()
            )));
        }
        let tx = r.transaction();
        if !(tx.amount() >= 0.0 && tx.time() >= 0.0) {
            return Err(PipelineError::invalid_metric(format!(
                "result {}: negative or NaN transaction values",
                r.sequence()
            )));
        }
    }

    if let Some(labels) = ground_truth {
        if labels.len() != results.len() {
            return Err(PipelineError::invalid_metric(format!(
                "{} labels for {} results",
                labels.len(),
                results.len()
            )));
        }
    }

    Ok(())
}

fn labeled_matrix(results: &[ClassificationResult], labels: &[bool]) -> ConfusionMatrix {
    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);

    for (r, &actual) in results.iter().zip(labels) {
        match (r.is_fraud(), actual) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    ConfusionMatrix::from_counts(tp, fp, tn, fn_)
}

/// Expected counts treating each confidence as the probability of fraud,
/// apportioned to integers (largest remainder) so they sum to the batch size.
fn estimated_matrix(results: &[ClassificationResult]) -> ConfusionMatrix {
    // [tp, fp, tn, fn]
    let mut expected = [0.0f64; 4];

    for r in results {
        let p = r.confidence();
        if r.is_fraud() {
            expected[0] += p;
            expected[1] += 1.0 - p;
        } else {
            expected[3] += p;
            expected[2] += 1.0 - p;
        }
    }

    let counts = apportion(&expected, results.len() as u64);
    ConfusionMatrix::from_counts(counts[0], counts[1], counts[2], counts[3])
}

fn apportion(expected: &[f64; 4], total: u64) -> [u64; 4] {
    let mut counts = expected.map(|e| e.max(0.0).floor() as u64);
    let assigned: u64 = counts.iter().sum();

    if assigned > total {
        // Only reachable through accumulated rounding error; trim the largest.
        let mut excess = assigned - total;
        while excess > 0 {
            if let Some(i) = (0..4).max_by_key(|&i| counts[i]) {
                counts[i] -= 1;
            }
            excess -= 1;
        }
        return counts;
    }

    let mut order: Vec<usize> = (0..4).collect();
    order.sort_by(|&a, &b| {
        let fa = expected[a] - expected[a].floor();
        let fb = expected[b] - expected[b].floor();
        fb.partial_cmp(&fa).unwrap_or(Ordering::Equal)
    });

    let remainder = (total - assigned) as usize;
    for &i in order.iter().cycle().take(remainder) {
        counts[i] += 1;
    }

    counts
}

/// Weighted Mann-Whitney AUC over `(score, positive_weight)` pairs, where each
/// item carries `1 - positive_weight` as negative weight. Ties count half.
fn weighted_auc<I>(items: I) -> f64
where
    I: Iterator<Item = (f64, f64)>,
{
    let mut items: Vec<(f64, f64)> = items.collect();
    items.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let total_pos: f64 = items.iter().map(|(_, w)| w).sum();
    let total_neg: f64 = items.iter().map(|(_, w)| 1.0 - w).sum();
    if total_pos <= 0.0 || total_neg <= 0.0 {
        return 0.0;
    }

    let mut numerator = 0.0;
    let mut neg_below = 0.0;
    let mut i = 0;

    while i < items.len() {
        let score = items[i].0;
        let (mut group_pos, mut group_neg) = (0.0, 0.0);
        while i < items.len() && items[i].0 == score {
            group_pos += items[i].1;
            group_neg += 1.0 - items[i].1;
            i += 1;
        }
        numerator += group_pos * (neg_below + 0.5 * group_neg);
        neg_below += group_neg;
    }

    (numerator / (total_pos * total_neg)).clamp(0.0, 1.0)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
