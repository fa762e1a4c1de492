//! Score aggregation for multi-signal scoring

use std::collections::{BTreeMap, HashMap};

/// Aggregates per-signal scores into a single fraud confidence.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    /// Signal weights for weighted average
    weights: HashMap<String, f64>,
    /// Default weight for signals not in the weights map
    default_weight: f64,
}

impl ScoreAggregator {
    /// Create a new score aggregator with signal weights.
    ///
    /// Negative and non-finite weights are treated as zero.
    pub fn new(weights: HashMap<String, f64>) -> Self {
        let weights = weights
            .into_iter()
            .map(|(name, w)| (name, if w.is_finite() { w.max(0.0) } else { 0.0 }))
            .collect();

        Self {
            weights,
            default_weight: 0.0,
        }
    }

    /// Aggregate signal scores into a single confidence.
    ///
    /// Uses a weighted average where weights are normalized over the signals
    /// actually present, so an absent signal does not drag the score down.
    /// Signals are summed in name order, so equal inputs give bit-identical
    /// results.
    pub fn aggregate(&self, signal_scores: &BTreeMap<String, f64>) -> f64 {
        if signal_scores.is_empty() {
            return 0.0;
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for (signal, &score) in signal_scores {
            let weight = self.weight(signal);
            weighted_sum += score.clamp(0.0, 1.0) * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            (weighted_sum / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn weight(&self, signal: &str) -> f64 {
        self.weights
            .get(signal)
            .copied()
            .unwrap_or(self.default_weight)
    }
}
