//! Record store abstraction and implementations
//!
//! Provides:
//! - A minimal key-value contract over the two record collections
//! - DynamoDB-backed production store
//! - In-memory store for tests and local wiring
//!
//! The contract is deliberately small: atomic per-key full replace, explicit
//! absence on reads, field-level merge for partial updates, and a bounded
//! scan with no ordering guarantee. Cursor pagination is not part of this
//! layer; a scan returning fewer than `limit` items says nothing about the
//! remainder. `scan_newest` is the one ordered query, backed by a sorted
//! timestamp index.

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::errors::Result;

/// The two independent collections this layer persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Paper records, deduplicated by url
    Papers,
    /// Search log records, append-style
    Searches,
}

impl Collection {
    /// Name of the primary key attribute for this collection.
    pub fn key_attribute(&self) -> &'static str {
        match self {
            Collection::Papers => "url",
            Collection::Searches => "search_id",
        }
    }

    /// Constant partition value for the timestamp-ordered index.
    pub fn kind(&self) -> &'static str {
        match self {
            Collection::Papers => "paper",
            Collection::Searches => "search",
        }
    }
}

/// Trait for record store backends.
///
/// Items are JSON objects; typed layers above (catalog, history) own the
/// serde conversion. All consistency guarantees come from the backing store:
/// atomic replace per key, no cross-key transactions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full replace of the record under `key`. Atomic per key.
    async fn put(&self, collection: Collection, key: &str, item: Value) -> Result<()>;

    /// Fetch the record under `key`. A missing key is `Ok(None)`, not an error.
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>>;

    /// Set only the named top-level fields, leaving the rest of the record
    /// untouched. Creates the record when absent (backing-store upsert
    /// semantics).
    async fn merge(&self, collection: Collection, key: &str, fields: Map<String, Value>)
        -> Result<()>;

    /// Read up to `limit` records with no ordering guarantee.
    async fn scan(&self, collection: Collection, limit: usize) -> Result<Vec<Value>>;

    /// Read up to `limit` records ordered newest-first by timestamp.
    async fn scan_newest(&self, collection: Collection, limit: usize) -> Result<Vec<Value>>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}

/// Create a record store based on configuration.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend.as_str() {
        "dynamo" => Ok(Arc::new(DynamoStore::new(config.clone()).await?)),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => {
            tracing::warn!(backend = other, "Unknown store backend, using memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_key_attributes() {
        assert_eq!(Collection::Papers.key_attribute(), "url");
        assert_eq!(Collection::Searches.key_attribute(), "search_id");
        assert_ne!(Collection::Papers.kind(), Collection::Searches.kind());
    }
}
