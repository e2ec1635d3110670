//! In-memory record store
//!
//! Backs tests and the `memory` wiring path. Matches the production store's
//! observable contract: per-key replace, upserting merge, unordered bounded
//! scan (hash-map iteration order), and a timestamp-descending ordered query.
//! A failure switch lets tests exercise the soft-failure read paths.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{Collection, RecordStore};
use crate::errors::{AppError, Result};

/// In-process store over two hash maps, one per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, HashMap<String, Value>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every operation fails with a store error. Used by tests to
    /// verify that read paths downgrade failures to absence.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Store {
                message: "Store unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Number of records currently held in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, HashMap::len)
    }
}

fn record_timestamp(item: &Value) -> chrono::DateTime<chrono::Utc> {
    item.get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, collection: Collection, key: &str, item: Value) -> Result<()> {
        self.check_available()?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(key.to_string(), item);
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    async fn merge(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        self.check_available()?;
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection).or_default();

        let record = records.entry(key.to_string()).or_insert_with(|| {
            // UpdateItem on a missing key creates the item
            let mut fresh = Map::new();
            fresh.insert(
                collection.key_attribute().to_string(),
                Value::String(key.to_string()),
            );
            Value::Object(fresh)
        });

        if let Value::Object(map) = record {
            for (name, value) in fields {
                map.insert(name, value);
            }
        }
        Ok(())
    }

    async fn scan(&self, collection: Collection, limit: usize) -> Result<Vec<Value>> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|records| records.values().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn scan_newest(&self, collection: Collection, limit: usize) -> Result<Vec<Value>> {
        self.check_available()?;
        let mut items: Vec<Value> = self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default();

        items.sort_by_key(|item| std::cmp::Reverse(record_timestamp(item)));
        items.truncate(limit);
        Ok(items)
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_key_is_absent_not_error() {
        let store = MemoryStore::new();
        let found = store
            .get(Collection::Papers, "https://arxiv.org/abs/9999.00000")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_put_is_full_replace() {
        let store = MemoryStore::new();
        let url = "https://arxiv.org/abs/1706.03762";

        store
            .put(
                Collection::Papers,
                url,
                json!({"url": url, "title": "Old", "summary": "kept?"}),
            )
            .await
            .unwrap();
        store
            .put(Collection::Papers, url, json!({"url": url, "title": "New"}))
            .await
            .unwrap();

        let item = store.get(Collection::Papers, url).await.unwrap().unwrap();
        assert_eq!(item["title"], "New");
        assert!(item.get("summary").is_none());
    }

    #[tokio::test]
    async fn test_merge_sets_only_named_fields() {
        let store = MemoryStore::new();
        let url = "https://arxiv.org/abs/1706.03762";

        store
            .put(
                Collection::Papers,
                url,
                json!({"url": url, "title": "Attention Is All You Need"}),
            )
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("summary".to_string(), json!("Transformers."));
        store.merge(Collection::Papers, url, fields).await.unwrap();

        let item = store.get(Collection::Papers, url).await.unwrap().unwrap();
        assert_eq!(item["title"], "Attention Is All You Need");
        assert_eq!(item["summary"], "Transformers.");
    }

    #[tokio::test]
    async fn test_merge_creates_missing_record() {
        let store = MemoryStore::new();
        let mut fields = Map::new();
        fields.insert("summary".to_string(), json!("s"));
        store
            .merge(Collection::Papers, "https://arxiv.org/abs/1", fields)
            .await
            .unwrap();

        let item = store
            .get(Collection::Papers, "https://arxiv.org/abs/1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item["url"], "https://arxiv.org/abs/1");
        assert_eq!(item["summary"], "s");
    }

    #[tokio::test]
    async fn test_scan_respects_limit() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let url = format!("https://arxiv.org/abs/2101.0000{i}");
            store
                .put(Collection::Papers, &url, json!({"url": url, "title": format!("P{i}")}))
                .await
                .unwrap();
        }

        let page = store.scan(Collection::Papers, 3).await.unwrap();
        assert_eq!(page.len(), 3);

        let all = store.scan(Collection::Papers, 100).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_scan_newest_orders_by_timestamp_descending() {
        let store = MemoryStore::new();
        for (i, ts) in ["2026-01-01T00:00:00Z", "2026-03-01T00:00:00Z", "2026-02-01T00:00:00Z"]
            .iter()
            .enumerate()
        {
            let id = format!("q_{i}");
            store
                .put(
                    Collection::Searches,
                    &id,
                    json!({"search_id": id, "query": "q", "results": [], "timestamp": ts}),
                )
                .await
                .unwrap();
        }

        let newest = store.scan_newest(Collection::Searches, 2).await.unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0]["timestamp"], "2026-03-01T00:00:00Z");
        assert_eq!(newest[1]["timestamp"], "2026-02-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_failing_store_errors_every_operation() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(store.get(Collection::Papers, "u").await.is_err());
        assert!(store.scan(Collection::Papers, 10).await.is_err());
        assert!(store.ping().await.is_err());
    }
}
