//! Types for the re-upload orchestrator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::identity::IdentityDocument;
use crate::job_source::{CandidateJob, JobSourceError};
use crate::media::{MediaError, MediaInfo};
use crate::store::StoreError;
use crate::torrent::{PipelineFailure, TorrentError, TorrentRecord, TorrentStatus};

/// Stops processing of the current job with a terminal pipeline failure.
/// Other jobs in the cycle are unaffected.
#[derive(Debug, Error)]
#[error("{}: {message}", .failure.code())]
pub struct JobAbort {
    pub failure: PipelineFailure,
    pub message: String,
}

impl JobAbort {
    pub fn new(failure: PipelineFailure, message: impl Into<String>) -> Self {
        Self {
            failure,
            message: message.into(),
        }
    }
}

impl From<MediaError> for JobAbort {
    fn from(err: MediaError) -> Self {
        let failure = match &err {
            MediaError::Extraction(_) => PipelineFailure::ExtractionFailed,
            MediaError::BasicInfo(_) => PipelineFailure::BasicInfoDetectionFailed,
            MediaError::DupeCheck(_) => PipelineFailure::DupeCheckFailed,
        };
        Self::new(failure, err.to_string())
    }
}

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job aborted: {0}")]
    Aborted(#[from] JobAbort),

    #[error("torrent state error: {0}")]
    Torrent(#[from] TorrentError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("job source error: {0}")]
    JobSource(#[from] JobSourceError),
}

/// Everything known about one job while it is being processed.
/// Built fresh for every job.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub job: CandidateJob,
    pub media: MediaInfo,
    pub identity: IdentityDocument,
    pub upload_attempt: u32,
    /// Target trackers for this attempt, in upload order.
    pub trackers: Vec<String>,
}

/// What happened to one job during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub hash: String,
    pub status: TorrentStatus,
    pub upload_attempt: u32,
    pub uploaded: Vec<String>,
    pub failed: Vec<String>,
    /// Trackers skipped because an earlier attempt already succeeded.
    pub already_uploaded: Vec<String>,
    pub message: Option<String>,
}

impl JobReport {
    pub fn from_record(record: &TorrentRecord) -> Self {
        Self {
            hash: record.hash.clone(),
            status: record.status.clone(),
            upload_attempt: record.upload_attempt,
            uploaded: Vec::new(),
            failed: Vec::new(),
            already_uploaded: Vec::new(),
            message: record.failure_message.clone(),
        }
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Jobs that passed the processable filter.
    pub processable: usize,
    pub jobs: Vec<JobReport>,
    /// Jobs that hit an unexpected error (store, job source).
    pub errors: Vec<String>,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestratorStatus {
    /// Whether the polling loop is running.
    pub running: bool,
    pub poll_interval_secs: u64,
    pub cycles_completed: u64,
    pub last_cycle: Option<CycleReport>,
    /// Tracked records per status literal.
    pub torrents_by_status: BTreeMap<String, i64>,
}
