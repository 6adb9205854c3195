//! Namespaced JSON document store.
//!
//! Every persisted entity (torrent records, job outcomes, cached identities)
//! is a JSON document living in a namespace and keyed by one of its own
//! fields.

mod document;
mod sqlite;

pub use document::{
    load, load_all, persist, Document, DocumentFilter, DocumentStore, FilterCondition, FilterOp,
    Namespace, StoreError,
};
pub use sqlite::SqliteDocumentStore;
