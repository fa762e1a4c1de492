//! Default heuristic classifier built from weighted scoring signals

use crate::config::{ClassifierConfig, ScoringStrategy};
use crate::feature_extractor::{FeatureExtractor, TransactionFeatures};
use crate::models::aggregator::ScoreAggregator;
use crate::models::classifier::Classifier;
use crate::types::result::{ClassificationResult, RiskLevel, RiskLevelThresholds};
use crate::types::transaction::Transaction;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Signal driven by transaction size
pub const SIGNAL_AMOUNT: &str = "amount";
/// Signal driven by hour of day
pub const SIGNAL_NIGHT: &str = "night";
/// Signal driven by the magnitude of the anonymized features
pub const SIGNAL_ANOMALY: &str = "anomaly";

/// Slope of the logistic curve over `ln(1 + amount)`
const AMOUNT_STEEPNESS: f64 = 1.5;
/// Hours in `[0, NIGHT_END_HOUR)` count as night
const NIGHT_END_HOUR: f64 = 6.0;
const NIGHT_SCORE: f64 = 0.8;
const DAY_SCORE: f64 = 0.1;

/// Result of heuristic scoring
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Aggregated fraud confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Individual signal scores
    pub signal_scores: BTreeMap<String, f64>,
}

/// Rule-based classifier combining amount, time-of-day and feature-anomaly
/// signals.
///
/// Decision threshold: a transaction is flagged when its aggregated
/// confidence is `>= threshold` (0.5 unless configured otherwise).
pub struct HeuristicClassifier {
    extractor: FeatureExtractor,
    aggregator: ScoreAggregator,
    strategy: ScoringStrategy,
    primary_signal: String,
    threshold: f64,
    pivot_log_amount: f64,
    anomaly_scale: f64,
    risk_levels: RiskLevelThresholds,
}

impl HeuristicClassifier {
    /// Create a classifier from configuration
    pub fn new(config: &ClassifierConfig) -> Self {
        let classifier = Self {
            extractor: FeatureExtractor::new(),
            aggregator: ScoreAggregator::new(config.weights.clone()),
            strategy: config.strategy.clone(),
            primary_signal: config.primary_signal.clone(),
            threshold: config.threshold.clamp(0.0, 1.0),
            pivot_log_amount: config.pivot_amount.max(0.0).ln_1p(),
            anomaly_scale: config.anomaly_scale.max(f64::EPSILON),
            risk_levels: config.risk_levels.clone(),
        };

        info!(
            strategy = ?classifier.strategy,
            primary_signal = %classifier.primary_signal,
            threshold = classifier.threshold,
            "Heuristic classifier initialized"
        );

        classifier
    }

    /// Get the current scoring strategy
    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    /// Score a transaction using the configured strategy
    pub fn score(&self, transaction: &Transaction) -> PredictionResult {
        let features = self.extractor.extract(transaction);
        let signal_scores = self.signal_scores(&features);

        let confidence = match self.strategy {
            ScoringStrategy::Primary => match signal_scores.get(&self.primary_signal) {
                Some(&score) => score,
                None => {
                    warn!(
                        primary_signal = %self.primary_signal,
                        "Primary signal unavailable, falling back to ensemble"
                    );
                    self.aggregator.aggregate(&signal_scores)
                }
            },
            ScoringStrategy::Ensemble => self.aggregator.aggregate(&signal_scores),
        }
        .clamp(0.0, 1.0);

        PredictionResult {
            confidence,
            signal_scores,
        }
    }

    fn signal_scores(&self, features: &TransactionFeatures) -> BTreeMap<String, f64> {
        let mut scores = BTreeMap::new();

        let amount = logistic(AMOUNT_STEEPNESS * (features.log_amount - self.pivot_log_amount));
        scores.insert(SIGNAL_AMOUNT.to_string(), amount);

        let night = if features.hour_of_day < NIGHT_END_HOUR {
            NIGHT_SCORE
        } else {
            DAY_SCORE
        };
        scores.insert(SIGNAL_NIGHT.to_string(), night);

        if let Some(magnitude) = features.feature_magnitude {
            let anomaly = 1.0 - (-magnitude / self.anomaly_scale).exp();
            scores.insert(SIGNAL_ANOMALY.to_string(), anomaly);
        }

        scores
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn classify(&self, transaction: &Transaction) -> ClassificationResult {
        let prediction = self.score(transaction);
        let risk_level = RiskLevel::from_score(prediction.confidence, &self.risk_levels);

        ClassificationResult::new(
            transaction.clone(),
            prediction.confidence >= self.threshold,
            prediction.confidence,
            risk_level,
        )
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
