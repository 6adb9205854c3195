//! Durable per-job tracking records.
//!
//! Every transition is persisted before the job source is relabeled, so a
//! crash mid-cycle is picked up again by re-reading the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::aggregate::aggregate_all;
use super::types::{JobOutcome, OutcomeStatus, PipelineFailure, TorrentRecord, TorrentStatus};
use crate::config::LabelConfig;
use crate::identity::{IdentityDocument, MediaCandidate};
use crate::job_source::{CandidateJob, JobSource, JobSourceError};
use crate::metrics;
use crate::store::{self, DocumentFilter, DocumentStore, StoreError};

/// Errors from state machine operations.
#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("torrent record not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("job source error: {0}")]
    JobSource(#[from] JobSourceError),
}

pub struct TorrentStateMachine {
    store: Arc<dyn DocumentStore>,
    job_source: Arc<dyn JobSource>,
    retry_limit: u32,
    labels: LabelConfig,
}

impl TorrentStateMachine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        job_source: Arc<dyn JobSource>,
        retry_limit: u32,
        labels: LabelConfig,
    ) -> Self {
        Self {
            store,
            job_source,
            retry_limit,
            labels,
        }
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Complete jobs whose stored record, if any, is not terminal.
    /// Source order is preserved. Nothing is written.
    pub async fn get_processable_jobs(&self) -> Result<Vec<CandidateJob>, TorrentError> {
        let jobs = self.job_source.list_candidate_jobs().await?;

        let mut processable = Vec::new();
        for job in jobs {
            if !job.is_complete() {
                debug!("Skipping incomplete job {} ({}/{})", job.hash, job.completed, job.size);
                continue;
            }
            match self.get(&job.hash)? {
                Some(record) if record.status.is_terminal() => {
                    debug!("Skipping {} in terminal state {}", job.hash, record.status);
                }
                _ => processable.push(job),
            }
        }

        Ok(processable)
    }

    /// Create the record on first sighting, otherwise bump the attempt
    /// counter. Returns `(record, skip)`; `skip` is set once the attempt
    /// counter passes the retry limit, at which point the record is marked
    /// `UNKNOWN_FAILURE`.
    pub fn init_or_load(&self, job: &CandidateJob) -> Result<(TorrentRecord, bool), TorrentError> {
        let Some(mut record) = self.get(&job.hash)? else {
            let record = TorrentRecord::new(job.hash.clone(), job.name.clone());
            store::persist(self.store.as_ref(), &record)?;
            info!("Tracking new job {} ({})", job.hash, job.name);
            return Ok((record, false));
        };

        record.upload_attempt += 1;
        record.name = job.name.clone();

        let skip = record.upload_attempt > self.retry_limit;
        if skip {
            warn!(
                "Job {} exceeded retry limit ({} > {}), marking {}",
                job.hash,
                record.upload_attempt,
                self.retry_limit,
                TorrentStatus::UnknownFailure
            );
            record.status = TorrentStatus::UnknownFailure;
            record.failure_message = Some(format!(
                "Retry limit of {} attempts exceeded",
                self.retry_limit
            ));
            metrics::RETRIES_EXHAUSTED.inc();
        }

        self.save(&mut record)?;
        Ok((record, skip))
    }

    /// Mark a terminal pipeline failure and relabel the job.
    pub async fn record_pipeline_failure(
        &self,
        hash: &str,
        failure: &PipelineFailure,
        message: Option<String>,
    ) -> Result<TorrentRecord, TorrentError> {
        let mut record = self.require(hash)?;
        record.status = failure.status();
        record.failure_message =
            Some(message.unwrap_or_else(|| failure.default_message().to_string()));
        self.save(&mut record)?;

        warn!(
            "Job {} failed with {}: {}",
            hash,
            failure.code(),
            record.failure_message.as_deref().unwrap_or_default()
        );
        metrics::PIPELINE_FAILURES
            .with_label_values(&[failure.code()])
            .inc();

        self.apply_label(&record).await;
        Ok(record)
    }

    /// Append a job outcome and recompute the record's aggregate status
    /// from the latest outcome of every tracker.
    pub fn record_tracker_outcome(
        &self,
        hash: &str,
        tracker: &str,
        success: bool,
        response: Value,
    ) -> Result<TorrentRecord, TorrentError> {
        let mut record = self.require(hash)?;

        let outcome = JobOutcome::new(
            hash,
            tracker,
            OutcomeStatus::from_success(success),
            response,
            record.upload_attempt,
        );
        store::persist(self.store.as_ref(), &outcome)?;

        let mut latest: HashMap<String, OutcomeStatus> = HashMap::new();
        for previous in self.outcomes(hash)? {
            latest.insert(previous.tracker, previous.status);
        }
        // The outcome just written is the newest for its tracker
        latest.insert(tracker.to_string(), outcome.status);

        if let Some(status) = aggregate_all(latest.into_values()) {
            debug!("Job {} aggregate after {} {}: {}", hash, tracker, outcome.status.as_str(), status);
            record.status = status;
        }
        record.failure_message = None;
        self.save(&mut record)?;

        Ok(record)
    }

    /// Store the resolved identity. A `PENDING` record becomes
    /// `READY_FOR_PROCESSING`.
    pub fn set_identity(
        &self,
        hash: &str,
        identity: IdentityDocument,
    ) -> Result<TorrentRecord, TorrentError> {
        let mut record = self.require(hash)?;
        record.identity = Some(identity);
        record.possible_matches = None;
        if record.status == TorrentStatus::Pending {
            record.status = TorrentStatus::ReadyForProcessing;
        }
        self.save(&mut record)?;
        Ok(record)
    }

    /// Store a partial identity with the candidates an operator can pick from.
    pub fn set_possible_matches(
        &self,
        hash: &str,
        partial: IdentityDocument,
        matches: Vec<MediaCandidate>,
    ) -> Result<TorrentRecord, TorrentError> {
        let mut record = self.require(hash)?;
        record.identity = Some(partial);
        record.possible_matches = Some(matches);
        self.save(&mut record)?;
        Ok(record)
    }

    pub fn set_target_trackers(
        &self,
        hash: &str,
        trackers: Vec<String>,
    ) -> Result<TorrentRecord, TorrentError> {
        let mut record = self.require(hash)?;
        record.target_trackers = trackers;
        self.save(&mut record)?;
        Ok(record)
    }

    /// Trackers with at least one successful outcome for this hash.
    pub fn succeeded_trackers(&self, hash: &str) -> Result<HashSet<String>, TorrentError> {
        Ok(self
            .outcomes(hash)?
            .into_iter()
            .filter(|o| o.status == OutcomeStatus::Success)
            .map(|o| o.tracker)
            .collect())
    }

    /// Write the label for the record's status back to the job source.
    /// Failures are logged; the record is already persisted.
    pub async fn apply_label(&self, record: &TorrentRecord) {
        let Some(label) = self.labels.label_for(&record.status) else {
            return;
        };
        if let Err(e) = self.job_source.relabel(&record.hash, label).await {
            warn!("Failed to relabel {} as {}: {}", record.hash, label, e);
        }
    }

    pub fn get(&self, hash: &str) -> Result<Option<TorrentRecord>, TorrentError> {
        Ok(store::load(self.store.as_ref(), hash)?)
    }

    pub fn list(&self, filter: &DocumentFilter) -> Result<Vec<TorrentRecord>, TorrentError> {
        Ok(store::load_all(self.store.as_ref(), filter)?)
    }

    /// All outcomes for a hash, oldest first.
    pub fn outcomes(&self, hash: &str) -> Result<Vec<JobOutcome>, TorrentError> {
        let filter = DocumentFilter::all().with_eq("hash", hash);
        Ok(store::load_all(self.store.as_ref(), &filter)?)
    }

    fn require(&self, hash: &str) -> Result<TorrentRecord, TorrentError> {
        self.get(hash)?
            .ok_or_else(|| TorrentError::NotFound(hash.to_string()))
    }

    fn save(&self, record: &mut TorrentRecord) -> Result<(), TorrentError> {
        record.date_updated = Utc::now();
        store::persist(self.store.as_ref(), record)?;
        Ok(())
    }
}
