//! Mock identity lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::identity::{ContentType, IdSystem, IdentityLookup, LookupError, MediaCandidate};

/// A recorded fetch_id call as (from, id, to).
pub type RecordedFetch = (IdSystem, String, IdSystem);

/// Mock implementation of the IdentityLookup trait.
///
/// Lookups are answered from a table of edges keyed by
/// `(from, id, to)`. Unknown edges return `Ok(None)`.
#[derive(Debug, Default)]
pub struct MockIdentityLookup {
    edges: Arc<RwLock<HashMap<RecordedFetch, String>>>,
    search_results: Arc<RwLock<Vec<MediaCandidate>>>,
    fetch_calls: Arc<RwLock<Vec<RecordedFetch>>>,
    search_calls: Arc<RwLock<usize>>,
    fail_all: Arc<RwLock<bool>>,
}

impl MockIdentityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `from:id -> to` with `value`.
    pub async fn add_edge(&self, from: IdSystem, id: &str, to: IdSystem, value: &str) {
        self.edges
            .write()
            .await
            .insert((from, id.to_string(), to), value.to_string());
    }

    pub async fn set_search_results(&self, results: Vec<MediaCandidate>) {
        *self.search_results.write().await = results;
    }

    /// Make every call return an API error.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    pub async fn fetch_calls(&self) -> Vec<RecordedFetch> {
        self.fetch_calls.read().await.clone()
    }

    pub async fn search_calls(&self) -> usize {
        *self.search_calls.read().await
    }

    async fn check_failure(&self) -> Result<(), LookupError> {
        if *self.fail_all.read().await {
            return Err(LookupError::ApiError {
                status: 503,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityLookup for MockIdentityLookup {
    async fn fetch_id(
        &self,
        from: IdSystem,
        id: &str,
        to: IdSystem,
        _content_type: ContentType,
    ) -> Result<Option<String>, LookupError> {
        let key = (from, id.to_string(), to);
        self.fetch_calls.write().await.push(key.clone());
        self.check_failure().await?;
        Ok(self.edges.read().await.get(&key).cloned())
    }

    async fn search(
        &self,
        _title: &str,
        _year: Option<u32>,
        content_type: ContentType,
    ) -> Result<Vec<MediaCandidate>, LookupError> {
        *self.search_calls.write().await += 1;
        self.check_failure().await?;
        Ok(self
            .search_results
            .read()
            .await
            .iter()
            .filter(|c| c.content_type == content_type)
            .cloned()
            .collect())
    }
}
