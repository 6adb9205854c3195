//! Mock tracker uploader for testing.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::orchestrator::JobContext;
use crate::trackers::{TrackerUploader, UploadError, UploadOutcome};

/// Mock implementation of the TrackerUploader trait.
///
/// Every upload succeeds unless its tracker was marked with
/// `fail_tracker` (tracker rejects) or `error_tracker` (request errors).
#[derive(Debug, Default)]
pub struct MockTrackerUploader {
    /// Recorded uploads as (hash, tracker).
    uploads: Arc<RwLock<Vec<(String, String)>>>,
    /// Recorded contexts, same order as `uploads`.
    contexts: Arc<RwLock<Vec<JobContext>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    erroring: Arc<RwLock<HashSet<String>>>,
}

impl MockTrackerUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracker answers uploads with a failure response.
    pub async fn fail_tracker(&self, tracker: &str) {
        self.failing.write().await.insert(tracker.to_string());
    }

    /// Uploads to the tracker return an error.
    pub async fn error_tracker(&self, tracker: &str) {
        self.erroring.write().await.insert(tracker.to_string());
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
        self.erroring.write().await.clear();
    }

    pub async fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.read().await.clone()
    }

    pub async fn contexts(&self) -> Vec<JobContext> {
        self.contexts.read().await.clone()
    }
}

#[async_trait]
impl TrackerUploader for MockTrackerUploader {
    async fn upload(
        &self,
        tracker: &str,
        context: &JobContext,
    ) -> Result<UploadOutcome, UploadError> {
        self.uploads
            .write()
            .await
            .push((context.job.hash.clone(), tracker.to_string()));
        self.contexts.write().await.push(context.clone());

        if self.erroring.read().await.contains(tracker) {
            return Err(UploadError::Http(format!("{} unreachable", tracker)));
        }
        if self.failing.read().await.contains(tracker) {
            return Ok(UploadOutcome::failed(json!({
                "success": false,
                "message": "rejected"
            })));
        }

        Ok(UploadOutcome::success(json!({
            "success": true,
            "attempt": context.upload_attempt
        })))
    }
}
