//! Best-effort document mirror of primary-store writes
//!
//! After a record is written to the primary SQLite store, the same record is
//! serialized and upserted into a secondary document store. The mirror is
//! one-directional: nothing is read back, retried, queued or reconciled.
//! A failed mirror write is logged and reported as [`MirrorOutcome::Failed`];
//! it never becomes an error for the caller.

pub mod backend;
pub mod document;
pub mod memory;
pub mod sqlite;

pub use backend::{DocumentStore, UpsertKind};
pub use document::{
    collection_specs, CollectionSpec, Document, DocumentKey, IndexSpec, Mirrored,
};
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

use crate::config::MirrorSettings;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Secondary-store failures
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Store unreachable or not configured
    #[error("Mirror unavailable: {0}")]
    Unavailable(String),

    /// SQL-backed document store error
    #[error("Mirror database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored document could not be encoded or decoded
    #[error("Mirror serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database, collection or field name not usable as an identifier
    #[error("Invalid mirror name: {0}")]
    InvalidName(String),
}

/// What happened to the secondary copy of a saved record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Mirroring is not configured
    Disabled,
    Inserted,
    Updated,
    /// The secondary write failed; the message was logged
    Failed(String),
}

impl MirrorOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, MirrorOutcome::Inserted | MirrorOutcome::Updated)
    }
}

/// Map a secondary-store result to an outcome: log, then continue
///
/// This is the only place mirror errors are handled, and it never returns one.
pub fn absorb(
    result: Result<UpsertKind, MirrorError>,
    collection: &str,
    label: &str,
) -> MirrorOutcome {
    match result {
        Ok(UpsertKind::Inserted) => {
            info!(collection, "{} synced to mirror (inserted)", label);
            MirrorOutcome::Inserted
        }
        Ok(UpsertKind::Updated) => {
            info!(collection, "{} synced to mirror (updated)", label);
            MirrorOutcome::Updated
        }
        Err(e) => {
            error!(collection, error = %e, "Error mirroring {}; primary write kept", label);
            MirrorOutcome::Failed(e.to_string())
        }
    }
}

/// Handle to the secondary store, shared by everything that saves records
///
/// Created once at startup and passed in; cloning shares the same store.
#[derive(Clone, Default)]
pub struct Mirror {
    store: Option<Arc<dyn DocumentStore>>,
}

impl Mirror {
    /// Mirror that replicates nothing
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Mirror writing to `store`
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Connect to the configured store, failing if it cannot be reached
    pub async fn connect_strict(settings: &MirrorSettings) -> Result<Self, MirrorError> {
        let store = SqliteDocumentStore::connect(settings).await?;
        store.ping().await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Connect if configured; any failure leaves the mirror disabled
    pub async fn connect(settings: Option<&MirrorSettings>) -> Self {
        let Some(settings) = settings else {
            info!("Mirror not configured; primary store only");
            return Self::disabled();
        };

        match Self::connect_strict(settings).await {
            Ok(mirror) => {
                info!(database = %settings.database, "Mirror connected");
                mirror
            }
            Err(e) => {
                warn!(error = %e, "Mirror connection failed; continuing without mirror");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Copy `record` into its collection. Never fails.
    pub async fn replicate<R: Mirrored>(&self, record: &R) -> MirrorOutcome {
        let Some(store) = &self.store else {
            debug!("Mirror disabled; skipping {}", record.label());
            return MirrorOutcome::Disabled;
        };

        let result = store
            .upsert(R::COLLECTION, &record.mirror_key(), &record.to_document())
            .await;
        absorb(result, R::COLLECTION, &record.label())
    }

    /// Check connectivity and create every collection with its indexes
    pub async fn setup_collections(&self) -> Result<Vec<&'static str>, MirrorError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| MirrorError::Unavailable("mirror not configured".to_string()))?;

        store.ping().await?;

        let mut created = Vec::new();
        for spec in collection_specs() {
            store.ensure_collection(&spec).await?;
            info!(
                backend = store.backend_name(),
                indexes = spec.indexes.len(),
                "Collection ready: {}",
                spec.name
            );
            created.push(spec.name);
        }
        Ok(created)
    }

    /// Look up a mirrored document (diagnostics and tests)
    pub async fn find_one(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<Document>, MirrorError> {
        match &self.store {
            Some(store) => store.find_one(collection, key).await,
            None => Ok(None),
        }
    }

    /// Release the store's connections
    pub async fn close(&self) {
        if let Some(store) = &self.store {
            store.close().await;
        }
    }
}
