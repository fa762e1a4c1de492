//! Transaction data structures for card fraud scoring

use crate::error::{PipelineError, Result};
use serde::Serialize;

/// Number of anonymized feature columns (`v1..v28`)
pub const FEATURE_COUNT: usize = 28;

/// A card transaction to be scored.
///
/// Values are validated on construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Seconds elapsed since the first transaction in the dataset
    time: f64,

    /// Transaction amount
    amount: f64,

    /// Anonymized features `v1..v28`; `None` where the source omitted a value
    features: Vec<Option<f64>>,
}

impl Transaction {
    /// Create a transaction without any anonymized features
    pub fn new(time: f64, amount: f64) -> Result<Self> {
        Self::with_features(time, amount, Vec::new())
    }

    /// Create a transaction with anonymized features (index 0 is `v1`)
    pub fn with_features(time: f64, amount: f64, features: Vec<Option<f64>>) -> Result<Self> {
        if !time.is_finite() || time < 0.0 {
            return Err(PipelineError::format(format!(
                "time must be a non-negative number, got {}",
                time
            )));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(PipelineError::format(format!(
                "amount must be a non-negative number, got {}",
                amount
            )));
        }
        if features.len() > FEATURE_COUNT {
            return Err(PipelineError::format(format!(
                "at most {} features are supported, got {}",
                FEATURE_COUNT,
                features.len()
            )));
        }
        if let Some(pos) = features.iter().position(|f| f.is_some_and(|v| !v.is_finite())) {
            return Err(PipelineError::format(format!("v{} is not a finite number", pos + 1)));
        }

        Ok(Self {
            time,
            amount,
            features,
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Feature `v{n}` (1-based), `None` when absent
    pub fn feature(&self, n: usize) -> Option<f64> {
        n.checked_sub(1)
            .and_then(|i| self.features.get(i))
            .copied()
            .flatten()
    }

    pub fn features(&self) -> &[Option<f64>] {
        &self.features
    }

    /// Values of the features that are present, in column order
    pub fn present_features(&self) -> impl Iterator<Item = f64> + '_ {
        self.features.iter().filter_map(|f| *f)
    }
}
