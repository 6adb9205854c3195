use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{IdentityDocument, MediaCandidate};
use crate::store::{Document, Namespace};

/// Processing status of a torrent record.
///
/// Serialized as the exact upper-case literal. Unknown literals (custom
/// pipeline failure codes) round-trip through [`TorrentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TorrentStatus {
    Pending,
    ReadyForProcessing,
    Success,
    Failed,
    PartiallySuccessful,
    DupeCheckFailed,
    TmdbIdentificationFailed,
    UnknownFailure,
    /// Any other pipeline failure code. Always terminal.
    Other(String),
}

impl TorrentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TorrentStatus::Pending => "PENDING",
            TorrentStatus::ReadyForProcessing => "READY_FOR_PROCESSING",
            TorrentStatus::Success => "SUCCESS",
            TorrentStatus::Failed => "FAILED",
            TorrentStatus::PartiallySuccessful => "PARTIALLY_SUCCESSFUL",
            TorrentStatus::DupeCheckFailed => "DUPE_CHECK_FAILED",
            TorrentStatus::TmdbIdentificationFailed => "TMDB_IDENTIFICATION_FAILED",
            TorrentStatus::UnknownFailure => "UNKNOWN_FAILURE",
            TorrentStatus::Other(code) => code,
        }
    }

    /// Terminal records are never picked up again.
    /// `SUCCESS` is terminal: every target tracker already has the upload.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TorrentStatus::Success
                | TorrentStatus::DupeCheckFailed
                | TorrentStatus::TmdbIdentificationFailed
                | TorrentStatus::UnknownFailure
                | TorrentStatus::Other(_)
        )
    }
}

impl From<String> for TorrentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => TorrentStatus::Pending,
            "READY_FOR_PROCESSING" => TorrentStatus::ReadyForProcessing,
            "SUCCESS" => TorrentStatus::Success,
            "FAILED" => TorrentStatus::Failed,
            "PARTIALLY_SUCCESSFUL" => TorrentStatus::PartiallySuccessful,
            "DUPE_CHECK_FAILED" => TorrentStatus::DupeCheckFailed,
            "TMDB_IDENTIFICATION_FAILED" => TorrentStatus::TmdbIdentificationFailed,
            "UNKNOWN_FAILURE" => TorrentStatus::UnknownFailure,
            _ => TorrentStatus::Other(value),
        }
    }
}

impl From<TorrentStatus> for String {
    fn from(status: TorrentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline-level failure: terminal, recorded once, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineFailure {
    /// Media attributes could not be extracted from the job.
    ExtractionFailed,
    /// Title/year/content type could not be detected.
    BasicInfoDetectionFailed,
    TmdbIdentificationFailed,
    /// The dupe checker itself errored.
    DupeCheckFailed,
    Other(String),
}

impl PipelineFailure {
    pub fn code(&self) -> &str {
        match self {
            PipelineFailure::ExtractionFailed => "EXTRACTION_FAILED",
            PipelineFailure::BasicInfoDetectionFailed => "BASIC_INFO_DETECTION_FAILED",
            PipelineFailure::TmdbIdentificationFailed => "TMDB_IDENTIFICATION_FAILED",
            PipelineFailure::DupeCheckFailed => "DUPE_CHECK_FAILED",
            PipelineFailure::Other(code) => code,
        }
    }

    pub fn status(&self) -> TorrentStatus {
        TorrentStatus::from(self.code().to_string())
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            PipelineFailure::ExtractionFailed => "Could not extract media information",
            PipelineFailure::BasicInfoDetectionFailed => {
                "Could not detect title, year or content type"
            }
            PipelineFailure::TmdbIdentificationFailed => "Could not resolve a TMDB identity",
            PipelineFailure::DupeCheckFailed => "Dupe check raised an error",
            PipelineFailure::Other(_) => "Pipeline failure",
        }
    }
}

/// Tracking record for one job, keyed by hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub hash: String,
    pub name: String,
    pub status: TorrentStatus,
    /// Starts at 1 and only ever grows.
    pub upload_attempt: u32,
    #[serde(default)]
    pub identity: Option<IdentityDocument>,
    #[serde(default)]
    pub possible_matches: Option<Vec<MediaCandidate>>,
    #[serde(default)]
    pub failure_message: Option<String>,
    /// Trackers targeted on the most recent attempt.
    #[serde(default)]
    pub target_trackers: Vec<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl TorrentRecord {
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            hash: hash.into(),
            name: name.into(),
            status: TorrentStatus::Pending,
            upload_attempt: 1,
            identity: None,
            possible_matches: None,
            failure_message: None,
            target_trackers: Vec::new(),
            date_created: now,
            date_updated: now,
        }
    }
}

impl Document for TorrentRecord {
    const NAMESPACE: Namespace = Namespace::Torrents;
}

/// Result of one tracker upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "SUCCESS",
            OutcomeStatus::Failed => "FAILED",
        }
    }
}

/// Append-only audit entry for one (hash, tracker) attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub hash: String,
    pub tracker: String,
    pub status: OutcomeStatus,
    /// Whatever the tracker (or uploader) returned.
    pub tracker_response: serde_json::Value,
    pub upload_attempt: u32,
    pub date_created: DateTime<Utc>,
}

impl JobOutcome {
    pub fn new(
        hash: impl Into<String>,
        tracker: impl Into<String>,
        status: OutcomeStatus,
        tracker_response: serde_json::Value,
        upload_attempt: u32,
    ) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            hash: hash.into(),
            tracker: tracker.into(),
            status,
            tracker_response,
            upload_attempt,
            date_created: Utc::now(),
        }
    }
}

impl Document for JobOutcome {
    const NAMESPACE: Namespace = Namespace::JobOutcomes;
}
