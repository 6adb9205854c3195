//! Mock media inspector for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::job_source::CandidateJob;
use crate::media::{MediaError, MediaInfo, MediaInspector, ReleaseNameInspector};

#[derive(Debug, Clone)]
enum Scripted {
    Info(MediaInfo),
    Extraction(String),
    BasicInfo(String),
}

/// Mock implementation of the MediaInspector trait.
///
/// Hashes without a scripted answer fall back to release-name parsing.
#[derive(Debug, Default)]
pub struct MockMediaInspector {
    scripted: Arc<RwLock<HashMap<String, Scripted>>>,
}

impl MockMediaInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_info(&self, hash: &str, info: MediaInfo) {
        self.scripted
            .write()
            .await
            .insert(hash.to_string(), Scripted::Info(info));
    }

    pub async fn fail_extraction(&self, hash: &str, message: &str) {
        self.scripted
            .write()
            .await
            .insert(hash.to_string(), Scripted::Extraction(message.to_string()));
    }

    pub async fn fail_basic_info(&self, hash: &str, message: &str) {
        self.scripted
            .write()
            .await
            .insert(hash.to_string(), Scripted::BasicInfo(message.to_string()));
    }
}

#[async_trait]
impl MediaInspector for MockMediaInspector {
    async fn inspect(&self, job: &CandidateJob) -> Result<MediaInfo, MediaError> {
        match self.scripted.read().await.get(&job.hash).cloned() {
            Some(Scripted::Info(info)) => Ok(info),
            Some(Scripted::Extraction(m)) => Err(MediaError::Extraction(m)),
            Some(Scripted::BasicInfo(m)) => Err(MediaError::BasicInfo(m)),
            None => ReleaseNameInspector::parse(&job.name),
        }
    }
}
