//! In-process document store
//!
//! Used for dry runs and tests. `set_unavailable(true)` makes every call fail
//! the way an unreachable server would.

use super::backend::{DocumentStore, UpsertKind};
use super::document::{CollectionSpec, Document, DocumentKey};
use super::MirrorError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    specs: Mutex<Vec<CollectionSpec>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage (or recovery)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All documents in `collection`, in insertion order
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Collection specs passed to `ensure_collection`
    pub async fn ensured(&self) -> Vec<CollectionSpec> {
        self.specs.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), MirrorError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(MirrorError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), MirrorError> {
        self.check_available()
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), MirrorError> {
        self.check_available()?;
        self.collections
            .lock()
            .await
            .entry(spec.name.to_string())
            .or_default();

        let mut specs = self.specs.lock().await;
        if !specs.iter().any(|s| s.name == spec.name) {
            specs.push(spec.clone());
        }
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &Document,
    ) -> Result<UpsertKind, MirrorError> {
        self.check_available()?;
        let mut collections = self.collections.lock().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = docs.iter_mut().find(|doc| key.matches(doc)) {
            for (field, value) in document {
                existing.insert(field.clone(), value.clone());
            }
            return Ok(UpsertKind::Updated);
        }

        let mut stored = document.clone();
        stored.insert("_id".into(), Value::String(Uuid::new_v4().to_string()));
        docs.push(stored);
        Ok(UpsertKind::Inserted)
    }

    async fn find_one(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<Document>, MirrorError> {
        self.check_available()?;
        Ok(self
            .collections
            .lock()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| key.matches(doc)).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let store = MemoryDocumentStore::new();
        let key = DocumentKey::new().field("email", "a@example.com");

        let first = store
            .upsert("auth_user", &key, &doc(json!({"email": "a@example.com", "first_name": "A"})))
            .await
            .unwrap();
        let second = store
            .upsert("auth_user", &key, &doc(json!({"email": "a@example.com", "first_name": "B"})))
            .await
            .unwrap();

        assert_eq!(first, UpsertKind::Inserted);
        assert_eq!(second, UpsertKind::Updated);

        let docs = store.documents("auth_user").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["first_name"], json!("B"));
        assert!(docs[0].contains_key("_id"));
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_writes() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);
        let result = store
            .upsert("auth_user", &DocumentKey::new(), &Document::new())
            .await;
        assert!(matches!(result, Err(MirrorError::Unavailable(_))));

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
