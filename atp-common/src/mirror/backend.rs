//! Document store abstraction behind the mirror

use super::document::{CollectionSpec, Document, DocumentKey};
use super::MirrorError;
use async_trait::async_trait;

/// Result of an upsert against the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    /// No document matched the key; a new one was created
    Inserted,
    /// An existing document matched the key; its fields were overwritten
    Updated,
}

/// Secondary document store
///
/// Collections are created on first write. `ensure_collection` exists for
/// setup, where indexes should be in place before data arrives.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Verify the store is reachable
    async fn ping(&self) -> Result<(), MirrorError>;

    /// Create a collection and its indexes (idempotent)
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), MirrorError>;

    /// Update the document matching `key` with the fields of `document`,
    /// or insert `document` when nothing matches
    async fn upsert(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &Document,
    ) -> Result<UpsertKind, MirrorError>;

    /// Fetch the first document matching `key`
    async fn find_one(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<Document>, MirrorError>;

    /// Release connections
    async fn close(&self) {}
}
