//! Fraud Scoring Pipeline Library
//!
//! Batch fraud scoring for card transactions: CSV and manual ingestion, a
//! heuristic classifier, confusion-matrix metrics and a single-job controller
//! that publishes results, summary and metrics together.

pub mod config;
pub mod controller;
pub mod error;
pub mod feature_extractor;
pub mod ingestion;
pub mod job;
pub mod metrics;
pub mod models;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use controller::{JobController, JobState, JobStatus, JobTicket};
pub use error::{ErrorKind, PipelineError};
pub use feature_extractor::FeatureExtractor;
pub use ingestion::{BulkSource, IngestionAdapter, ManualEntry};
pub use job::Job;
pub use metrics::{ConfusionMatrix, Metrics, MetricsAggregator};
pub use models::HeuristicClassifier;
pub use store::{OutcomeFilter, Page, ResultCursor, ResultStore};
pub use types::{ClassificationResult, Transaction};
