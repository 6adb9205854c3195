//! Mock job source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::LabelConfig;
use crate::job_source::{trackers_from_label, CandidateJob, JobSource, JobSourceError};

/// Mock implementation of the JobSource trait.
///
/// Relabeling updates the stored job's category, the way qBittorrent
/// would, so later cycles see the new label.
///
/// # Example
///
/// ```rust,ignore
/// let source = MockJobSource::new();
/// source.set_jobs(vec![fixtures::candidate_job("abc", "Heat.1995.1080p")]).await;
///
/// // ... run a cycle ...
///
/// assert_eq!(source.relabels().await, vec![("abc".into(), "GGBOT_UPLOADED".into())]);
/// ```
#[derive(Debug)]
pub struct MockJobSource {
    jobs: Arc<RwLock<Vec<CandidateJob>>>,
    /// Recorded relabel calls as (hash, label).
    relabels: Arc<RwLock<Vec<(String, String)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<JobSourceError>>>,
    labels: LabelConfig,
}

impl Default for MockJobSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJobSource {
    pub fn new() -> Self {
        Self::with_labels(LabelConfig::default())
    }

    pub fn with_labels(labels: LabelConfig) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            relabels: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            labels,
        }
    }

    /// Replace the listed jobs.
    pub async fn set_jobs(&self, jobs: Vec<CandidateJob>) {
        *self.jobs.write().await = jobs;
    }

    pub async fn jobs(&self) -> Vec<CandidateJob> {
        self.jobs.read().await.clone()
    }

    /// Get all relabel calls, oldest first.
    pub async fn relabels(&self) -> Vec<(String, String)> {
        self.relabels.read().await.clone()
    }

    /// Make the next operation fail.
    pub async fn set_next_error(&self, error: JobSourceError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Result<(), JobSourceError> {
        match self.next_error.write().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobSource for MockJobSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_candidate_jobs(&self) -> Result<Vec<CandidateJob>, JobSourceError> {
        self.take_error().await?;
        Ok(self.jobs.read().await.clone())
    }

    async fn relabel(&self, hash: &str, label: &str) -> Result<(), JobSourceError> {
        self.take_error().await?;
        self.relabels
            .write()
            .await
            .push((hash.to_string(), label.to_string()));
        if let Some(job) = self.jobs.write().await.iter_mut().find(|j| j.hash == hash) {
            job.category = label.to_string();
        }
        Ok(())
    }

    fn dynamic_trackers(&self, job: &CandidateJob) -> Vec<String> {
        trackers_from_label(job, &self.labels.prefix, &self.labels.delimiter)
    }
}
