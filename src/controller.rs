//! Job controller: single-job state machine and status publishing.
//!
//! States move `Idle -> Processing -> Succeeded | Failed`. Only one job is
//! accepted at a time; acceptance is an atomic check-and-transition on the
//! status channel, so racing submissions cannot both start. The job being
//! built is private to its worker task until it is published, together with
//! its summary, metrics and results, in a single status update.

use crate::config::AppConfig;
use crate::error::{ErrorInfo, PipelineError, Result};
use crate::ingestion::{BulkSource, IngestionAdapter, LabeledBatch, ManualEntry};
use crate::job::{Job, SubmissionKind};
use crate::metrics::{Metrics, MetricsAggregator};
use crate::models::classifier::{classify_batch, Classifier};
use crate::models::heuristic::HeuristicClassifier;
use crate::store::{Page, ResultPredicate, ResultStore};
use crate::types::result::BatchSummary;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Processing state published to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Processing,
    Succeeded,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Processing => write!(f, "Processing"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Snapshot of controller state; `job` is the live (displayed) job
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    pub job: Option<Arc<Job>>,
    pub error: Option<ErrorInfo>,
    pub message: Option<String>,
}

impl JobStatus {
    fn idle() -> Self {
        Self {
            state: JobState::Idle,
            job: None,
            error: None,
            message: None,
        }
    }
}

/// Work submitted to the controller
#[derive(Debug, Clone)]
pub enum Submission {
    Bulk(BulkSource),
    Manual(ManualEntry),
}

impl Submission {
    fn kind(&self) -> SubmissionKind {
        match self {
            Submission::Bulk(_) => SubmissionKind::Bulk,
            Submission::Manual(_) => SubmissionKind::Manual,
        }
    }

    fn source_name(&self) -> String {
        match self {
            Submission::Bulk(source) => source.name.clone(),
            Submission::Manual(_) => "manual entry".to_string(),
        }
    }
}

/// Handle to an accepted submission
pub struct JobTicket {
    job_id: Uuid,
    handle: JoinHandle<Result<Arc<Job>>>,
}

impl JobTicket {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Wait for the job to finish.
    ///
    /// Returns the job's own outcome even if it was superseded by `clear`
    /// and therefore never published.
    pub async fn wait(self) -> Result<Arc<Job>> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(PipelineError::Internal(e.to_string())),
        }
    }
}

struct Inner {
    ingestion: IngestionAdapter,
    classifier: Arc<dyn Classifier>,
    aggregator: MetricsAggregator,
    timeout: Option<Duration>,
    status_tx: watch::Sender<JobStatus>,
    /// Bumped on every acceptance and every clear; a worker only publishes if
    /// its generation is still current.
    generation: AtomicU64,
    /// Held for the lifetime of a pipeline run
    worker: Arc<Mutex<()>>,
}

/// Owns the processing state machine and the live job
#[derive(Clone)]
pub struct JobController {
    inner: Arc<Inner>,
}

impl JobController {
    /// Controller with the default heuristic classifier
    pub fn from_config(config: &AppConfig) -> Self {
        let classifier = Arc::new(HeuristicClassifier::new(&config.classifier));
        Self::new(config, classifier)
    }

    /// Controller with a caller-supplied classifier
    pub fn new(config: &AppConfig, classifier: Arc<dyn Classifier>) -> Self {
        let (status_tx, _) = watch::channel(JobStatus::idle());

        info!(
            classifier = classifier.name(),
            threshold = classifier.threshold(),
            max_records = config.ingestion.max_records,
            label_policy = ?config.aggregation.label_policy,
            timeout = ?config.pipeline.timeout(),
            "Job controller initialized"
        );

        Self {
            inner: Arc::new(Inner {
                ingestion: IngestionAdapter::new(config.ingestion.max_records),
                classifier,
                aggregator: MetricsAggregator::new(config.aggregation.label_policy),
                timeout: config.pipeline.timeout(),
                status_tx,
                generation: AtomicU64::new(0),
                worker: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Submit a CSV source for scoring
    pub fn submit_bulk(&self, source: BulkSource) -> Result<JobTicket> {
        self.submit(Submission::Bulk(source))
    }

    /// Submit a single manually entered transaction
    pub fn submit_manual(&self, entry: ManualEntry) -> Result<JobTicket> {
        self.submit(Submission::Manual(entry))
    }

    /// Accept a submission unless a job is already processing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, submission: Submission) -> Result<JobTicket> {
        let inner = &self.inner;
        let mut generation = None;

        inner.status_tx.send_if_modified(|status| {
            if status.state == JobState::Processing {
                return false;
            }
            // The previous job stays visible until the new one is published.
            status.state = JobState::Processing;
            status.error = None;
            status.message = None;
            generation = Some(inner.generation.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });

        let Some(generation) = generation else {
            warn!(source = %submission.source_name(), "Submission rejected: job in progress");
            return Err(PipelineError::JobInProgress);
        };

        let job_id = Uuid::new_v4();
        info!(
            job_id = %job_id,
            source = %submission.source_name(),
            kind = ?submission.kind(),
            "Job accepted"
        );

        let started = Instant::now();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let outcome = inner.run(job_id, submission, started).await.map(Arc::new);
            inner.publish(generation, job_id, &outcome);
            outcome
        });

        Ok(JobTicket { job_id, handle })
    }

    /// Discard the live job and any error, returning to `Idle`.
    ///
    /// A job still in flight keeps running but its result is never published.
    pub fn clear(&self) {
        let inner = &self.inner;
        inner.status_tx.send_modify(|status| {
            inner.generation.fetch_add(1, Ordering::SeqCst);
            *status = JobStatus::idle();
        });
        info!("Job results cleared");
    }

    /// Current status snapshot
    pub fn status(&self) -> JobStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Receiver notified on every status transition
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn state(&self) -> JobState {
        self.inner.status_tx.borrow().state
    }

    /// The live job, if any. While a new job is processing this is still the
    /// previously published one.
    pub fn current_job(&self) -> Option<Arc<Job>> {
        self.inner.status_tx.borrow().job.clone()
    }

    pub fn summary(&self) -> Option<BatchSummary> {
        self.current_job().map(|job| job.summary.clone())
    }

    pub fn metrics(&self) -> Option<Metrics> {
        self.current_job().map(|job| job.metrics.clone())
    }

    /// Filter and paginate the live job's results
    pub fn filter_and_page<P: ResultPredicate + ?Sized>(
        &self,
        predicate: &P,
        page_index: usize,
        page_size: usize,
    ) -> Option<Page> {
        self.current_job()
            .map(|job| job.store.filter_and_page(predicate, page_index, page_size))
    }
}

impl Inner {
    async fn run(self: &Arc<Self>, job_id: Uuid, submission: Submission, started: Instant) -> Result<Job> {
        let this = Arc::clone(self);
        // The deadline covers waiting for a superseded run as well as this one.
        let work = async move {
            let worker = Arc::clone(&this.worker).lock_owned().await;
            tokio::task::spawn_blocking(move || {
                let _worker = worker;
                this.process(job_id, submission, started)
            })
            .await
        };

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| PipelineError::Timeout(limit))?,
            None => work.await,
        };

        joined.map_err(|e| PipelineError::Internal(format!("worker failed: {}", e)))?
    }

    /// Ingestion -> classification -> aggregation -> store, on a blocking thread
    fn process(&self, job_id: Uuid, submission: Submission, started: Instant) -> Result<Job> {
        let submitted_at = Utc::now();
        let kind = submission.kind();
        let source = submission.source_name();

        let batch = match submission {
            Submission::Bulk(source) => self.ingestion.parse_bulk(&source)?,
            Submission::Manual(entry) => LabeledBatch {
                transactions: vec![self.ingestion.parse_single(&entry)?],
                labels: None,
            },
        };

        let results = classify_batch(self.classifier.as_ref(), &batch.transactions);
        let metrics = self.aggregator.aggregate(&results, batch.labels.as_deref())?;
        let summary = BatchSummary::from_results(&results, started.elapsed().as_millis() as u64);

        Ok(Job {
            id: job_id,
            kind,
            source,
            classifier: self.classifier.name().to_string(),
            submitted_at,
            completed_at: Utc::now(),
            summary,
            metrics,
            store: ResultStore::new(results),
        })
    }

    fn publish(&self, generation: u64, job_id: Uuid, outcome: &Result<Arc<Job>>) {
        let published = self.status_tx.send_if_modified(|status| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match outcome {
                Ok(job) => {
                    status.state = JobState::Succeeded;
                    status.message = Some(job.completion_message());
                    status.error = None;
                    status.job = Some(Arc::clone(job));
                }
                Err(e) => {
                    status.state = JobState::Failed;
                    status.message = None;
                    status.error = Some(ErrorInfo::from(e));
                }
            }
            true
        });

        match (published, outcome) {
            (false, _) => info!(job_id = %job_id, "Job superseded, result discarded"),
            (true, Ok(job)) => info!(
                job_id = %job_id,
                transactions = job.summary.total_transactions,
                flagged = job.summary.fraud_count,
                processing_time_ms = job.summary.processing_time_millis,
                "Job succeeded"
            ),
            (true, Err(e)) => error!(
                job_id = %job_id,
                kind = ?e.kind(),
                error = %e,
                "Job failed"
            ),
        }
    }
}
