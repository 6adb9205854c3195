use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Document in namespace {namespace} has no string field '{field}'")]
    MissingKey { namespace: String, field: String },
}

/// Document namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Torrents,
    JobOutcomes,
    IdentityCache,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Torrents => "torrents",
            Namespace::JobOutcomes => "job_outcomes",
            Namespace::IdentityCache => "identity_cache",
        }
    }

    /// Name of the document field holding the key.
    pub fn key_field(&self) -> &'static str {
        match self {
            Namespace::Torrents => "hash",
            Namespace::JobOutcomes => "job_id",
            Namespace::IdentityCache => "cache_key",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied to a top-level document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gte,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Filter for listing and counting documents.
/// Conditions are ANDed together.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFilter {
    pub conditions: Vec<FilterCondition>,
    /// Maximum number of results. Negative means no limit.
    pub limit: i64,
    pub offset: i64,
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            limit: 100,
            offset: 0,
        }
    }

    /// Filter without a result limit.
    pub fn all() -> Self {
        Self {
            limit: -1,
            ..Self::new()
        }
    }

    fn with_condition(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push(FilterCondition {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn with_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.with_condition(field, FilterOp::Eq, value)
    }

    pub fn with_ne(self, field: &str, value: impl Into<Value>) -> Self {
        self.with_condition(field, FilterOp::Ne, value)
    }

    pub fn with_gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.with_condition(field, FilterOp::Gte, value)
    }

    pub fn with_lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.with_condition(field, FilterOp::Lte, value)
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for document storage backends.
///
/// Saving a document whose key already exists replaces it.
/// Listing returns documents in the order they were first saved.
pub trait DocumentStore: Send + Sync {
    /// Get a document by key.
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Value>, StoreError>;

    /// Insert or replace a document. The key is read from the namespace's key field.
    fn save(&self, namespace: Namespace, document: &Value) -> Result<(), StoreError>;

    /// List documents matching the filter.
    fn list(&self, namespace: Namespace, filter: &DocumentFilter)
        -> Result<Vec<Value>, StoreError>;

    /// Count documents matching the filter (limit and offset are ignored).
    fn count(&self, namespace: Namespace, filter: &DocumentFilter) -> Result<i64, StoreError>;

    /// Delete a document. Returns whether it existed.
    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StoreError>;
}

/// A typed document bound to a namespace.
pub trait Document: Serialize + DeserializeOwned {
    const NAMESPACE: Namespace;
}

/// Load and deserialize one document.
pub fn load<D: Document>(store: &dyn DocumentStore, key: &str) -> Result<Option<D>, StoreError> {
    store
        .get(D::NAMESPACE, key)?
        .map(|value| {
            serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()
}

/// Serialize and save one document.
pub fn persist<D: Document>(store: &dyn DocumentStore, document: &D) -> Result<(), StoreError> {
    let value =
        serde_json::to_value(document).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.save(D::NAMESPACE, &value)
}

/// Load and deserialize every document matching the filter.
pub fn load_all<D: Document>(
    store: &dyn DocumentStore,
    filter: &DocumentFilter,
) -> Result<Vec<D>, StoreError> {
    store
        .list(D::NAMESPACE, filter)?
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder() {
        let filter = DocumentFilter::new()
            .with_eq("status", "FAILED")
            .with_gte("upload_attempt", 2)
            .with_limit(10)
            .with_offset(5);

        assert_eq!(filter.conditions.len(), 2);
        assert_eq!(filter.conditions[0].op, FilterOp::Eq);
        assert_eq!(filter.conditions[1].value, Value::from(2));
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 5);
    }

    #[test]
    fn test_filter_all_is_unbounded() {
        assert_eq!(DocumentFilter::all().limit, -1);
        assert_eq!(DocumentFilter::default().limit, 100);
    }

    #[test]
    fn test_namespace_key_fields() {
        assert_eq!(Namespace::Torrents.key_field(), "hash");
        assert_eq!(Namespace::JobOutcomes.key_field(), "job_id");
        assert_eq!(Namespace::IdentityCache.to_string(), "identity_cache");
    }
}
