//! Job source abstraction.
//!
//! The job source is where completed downloads come from and where their
//! labels are written back. qBittorrent is the only backend.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentJobSource;
pub use types::*;

use async_trait::async_trait;

use crate::trackers::parse_label_trackers;

/// Trait for job source backends.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Backend name (for logging).
    fn name(&self) -> &str;

    /// Jobs currently watched by the orchestrator, in source order.
    async fn list_candidate_jobs(&self) -> Result<Vec<CandidateJob>, JobSourceError>;

    /// Replace a job's label.
    async fn relabel(&self, hash: &str, label: &str) -> Result<(), JobSourceError>;

    /// Tracker codes encoded in the job's label, in label order.
    fn dynamic_trackers(&self, job: &CandidateJob) -> Vec<String>;
}

/// Default label parsing shared by backends that store hints in the label.
pub fn trackers_from_label(job: &CandidateJob, prefix: &str, delimiter: &str) -> Vec<String> {
    parse_label_trackers(&job.category, prefix, delimiter)
}
