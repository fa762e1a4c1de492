//! Configuration management for the scoring pipeline

use crate::types::result::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Default cap on data rows per job
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

/// Signal combination strategy for the heuristic classifier
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// Use only the primary signal
    Primary,
    /// Weighted combination of every available signal
    #[default]
    Ensemble,
}

/// What to do when a batch has no ground-truth labels
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// Fail the job with `LabelsRequired`
    Require,
    /// Derive confidence-weighted metrics and mark them as estimated
    #[default]
    Estimate,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record ingestion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Maximum data rows accepted per job
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

/// Heuristic classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// "primary" (single signal) or "ensemble" (all signals)
    #[serde(default)]
    pub strategy: ScoringStrategy,
    /// Signal used by the primary strategy
    #[serde(default = "default_primary_signal")]
    pub primary_signal: String,
    /// Confidence at or above which a transaction is flagged
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Amount at which the amount signal reaches 0.5
    #[serde(default = "default_pivot_amount")]
    pub pivot_amount: f64,
    /// Mean absolute feature value at which the anomaly signal reaches ~0.63
    #[serde(default = "default_anomaly_scale")]
    pub anomaly_scale: f64,
    /// Per-signal weights for the ensemble strategy
    #[serde(default = "default_signal_weights")]
    pub weights: HashMap<String, f64>,
    /// Confidence bands for risk levels
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

fn default_primary_signal() -> String {
    "amount".to_string()
}

fn default_threshold() -> f64 {
    0.5
}

fn default_pivot_amount() -> f64 {
    2000.0
}

fn default_anomaly_scale() -> f64 {
    2.0
}

fn default_signal_weights() -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    weights.insert("amount".to_string(), 0.4);
    weights.insert("night".to_string(), 0.2);
    weights.insert("anomaly".to_string(), 0.4);
    weights
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::Ensemble,
            primary_signal: default_primary_signal(),
            threshold: default_threshold(),
            pivot_amount: default_pivot_amount(),
            anomaly_scale: default_anomaly_scale(),
            weights: default_signal_weights(),
            risk_levels: RiskLevelThresholds::default(),
        }
    }
}

/// Metrics aggregation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregationConfig {
    /// Behaviour for unlabeled batches
    #[serde(default)]
    pub label_policy: LabelPolicy,
}

/// Job processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for a single job in milliseconds; 0 disables the deadline
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Default page size for result listings
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_page_size() -> usize {
    10
}

impl PipelineConfig {
    /// Job deadline, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ingestion: IngestionConfig::default(),
            classifier: ClassifierConfig::default(),
            aggregation: AggregationConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
