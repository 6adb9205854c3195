use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ContentType, IdentityDocument};
use crate::store::{self, Document, DocumentStore, Namespace, StoreError};

/// A resolved identity cached under its lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedIdentity {
    pub cache_key: String,
    pub identity: IdentityDocument,
    pub cached_at: DateTime<Utc>,
}

impl Document for CachedIdentity {
    const NAMESPACE: Namespace = Namespace::IdentityCache;
}

/// Identity cache keyed by `(title, year, content_type)`.
#[derive(Clone)]
pub struct IdentityCache {
    store: Arc<dyn DocumentStore>,
}

impl IdentityCache {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Build the cache key. Titles are compared case- and punctuation-insensitively.
    pub fn cache_key(title: &str, year: Option<u32>, content_type: ContentType) -> String {
        let title = normalize_title(title);
        let year = year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
        format!("{}|{}|{}", title, year, content_type.as_str())
    }

    pub fn get(
        &self,
        title: &str,
        year: Option<u32>,
        content_type: ContentType,
    ) -> Result<Option<IdentityDocument>, StoreError> {
        let key = Self::cache_key(title, year, content_type);
        let cached: Option<CachedIdentity> = store::load(self.store.as_ref(), &key)?;
        Ok(cached.map(|c| c.identity))
    }

    pub fn put(
        &self,
        title: &str,
        year: Option<u32>,
        content_type: ContentType,
        identity: &IdentityDocument,
    ) -> Result<(), StoreError> {
        let entry = CachedIdentity {
            cache_key: Self::cache_key(title, year, content_type),
            identity: identity.clone(),
            cached_at: Utc::now(),
        };
        store::persist(self.store.as_ref(), &entry)
    }
}

/// Lowercase, alphanumeric words separated by single spaces.
pub(crate) fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
