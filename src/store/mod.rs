//! Document-store seam: the shared error taxonomy, the metadata envelope
//! carried by every stored document, and the in-memory store used by the
//! service binary and the test suites.

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy for document-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document already exists")]
    Conflict,
    #[error("document not found")]
    NotFound,
    #[error("concurrent modification, transaction aborted")]
    Contention,
    #[error("no index covers this query: {0}")]
    IndexUnavailable(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Metadata envelope shared by every collection.
///
/// `created_at` is immutable once set; `updated_at` advances on every
/// mutation; a set `deleted_at` is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub tags: Vec<String>,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn seed(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 1,
            tags: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }
}

static STORE: OnceLock<Arc<MemoryStore>> = OnceLock::new();

/// Idempotent process-wide store bootstrap; every caller gets the same
/// handle.
pub fn ensure_initialized() -> Arc<MemoryStore> {
    STORE.get_or_init(|| Arc::new(MemoryStore::default())).clone()
}
