//! Error taxonomy for the scoring pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `PipelineError`.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by pipeline stages and the job controller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// Malformed input: missing columns, unparsable cells, unknown fields
    #[error("Format error: {0}")]
    Format(String),

    /// The source contained a header but no data rows
    #[error("No transactions found in input")]
    EmptyInput,

    /// The source holds more rows than a single job may process
    #[error("Input exceeds capacity of {limit} records")]
    CapacityExceeded {
        /// Configured record cap
        limit: usize,
    },

    /// Ground truth is required by the configured label policy but absent
    #[error("Ground-truth labels are required to compute metrics")]
    LabelsRequired,

    /// Metric computation was given negative, NaN or inconsistent inputs
    #[error("Invalid metric input: {0}")]
    InvalidMetricInput(String),

    /// A job is already being processed
    #[error("A job is already in progress")]
    JobInProgress,

    /// Processing did not finish before the configured deadline
    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    /// Worker task failure (panic or cancellation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error category published to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    EmptyInput,
    CapacityExceeded,
    LabelsRequired,
    InvalidMetricInput,
    JobInProgress,
    Timeout,
    Internal,
}

impl PipelineError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Format(_) => ErrorKind::Format,
            PipelineError::EmptyInput => ErrorKind::EmptyInput,
            PipelineError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            PipelineError::LabelsRequired => ErrorKind::LabelsRequired,
            PipelineError::InvalidMetricInput(_) => ErrorKind::InvalidMetricInput,
            PipelineError::JobInProgress => ErrorKind::JobInProgress,
            PipelineError::Timeout(_) => ErrorKind::Timeout,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        PipelineError::Format(msg.into())
    }

    pub(crate) fn invalid_metric(msg: impl Into<String>) -> Self {
        PipelineError::InvalidMetricInput(msg.into())
    }
}

/// Structured error published with a `Failed` status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ErrorInfo {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<PipelineError> for ErrorInfo {
    fn from(err: PipelineError) -> Self {
        ErrorInfo::from(&err)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Format(err.to_string())
    }
}
