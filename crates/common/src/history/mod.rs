//! Search history: write-then-list logic over the searches collection
//!
//! Search records are write-once; the listing returns a projected view. Two
//! recency semantics are supported, chosen at construction:
//!
//! - `ScanPage` reproduces the reference contract exactly: read up to
//!   `limit` records via the unordered scan, then sort the retrieved page by
//!   timestamp descending. Because the limit applies before the sort, this
//!   is "N arbitrary records, then sorted", not the N most recent.
//! - `Indexed` uses the store's timestamp index and really returns the N
//!   most recent. Opt-in behavior change.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::errors::Result;
use crate::records::{PaperRef, SearchDigest, SearchRecord};
use crate::store::{Collection, RecordStore};

/// Recency semantics for [`SearchHistory::list_recent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecencyOrder {
    /// Unordered scan page, sorted after retrieval (faithful default)
    #[default]
    ScanPage,
    /// Timestamp index query, truly newest-first
    Indexed,
}

impl RecencyOrder {
    /// Parse the configured mode, falling back to the faithful default.
    pub fn from_config(config: &HistoryConfig) -> Self {
        match config.recency_order.as_str() {
            "indexed" => RecencyOrder::Indexed,
            "scan-page" => RecencyOrder::ScanPage,
            other => {
                warn!(recency_order = other, "Unknown recency order, using scan-page");
                RecencyOrder::ScanPage
            }
        }
    }
}

/// Append-and-list layer over the searches collection.
#[derive(Clone)]
pub struct SearchHistory {
    store: Arc<dyn RecordStore>,
    order: RecencyOrder,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_order(store, RecencyOrder::default())
    }

    pub fn with_order(store: Arc<dyn RecordStore>, order: RecencyOrder) -> Self {
        Self { store, order }
    }

    /// Append one search invocation to the log and return its identifier.
    ///
    /// The identifier concatenates the query text with a second-resolution
    /// timestamp. No uniqueness check is performed; identical queries within
    /// the same second collide and the store's last write wins, which is
    /// indistinguishable from success for the caller.
    pub async fn record_search(&self, query: &str, results: &[PaperRef]) -> Result<String> {
        let now = Utc::now();
        let search_id = format!("{}_{}", query, now.format("%Y%m%d_%H%M%S"));

        let record = SearchRecord {
            search_id: search_id.clone(),
            query: query.to_string(),
            results: results.to_vec(),
            timestamp: now,
        };

        let item = serde_json::to_value(&record)?;
        self.store
            .put(Collection::Searches, &search_id, item)
            .await?;

        debug!(search_id = %search_id, results = results.len(), "Search recorded");
        Ok(search_id)
    }

    /// List up to `limit` search digests, most recent first within the
    /// semantics of the configured [`RecencyOrder`].
    ///
    /// Store failures are swallowed; the caller sees an empty listing.
    pub async fn list_recent(&self, limit: usize) -> Vec<SearchDigest> {
        let read = match self.order {
            RecencyOrder::ScanPage => self.store.scan(Collection::Searches, limit).await,
            RecencyOrder::Indexed => self.store.scan_newest(Collection::Searches, limit).await,
        };

        let items = match read {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to read search history");
                return Vec::new();
            }
        };

        let mut records: Vec<SearchRecord> = items
            .into_iter()
            .filter_map(|item: Value| serde_json::from_value(item).ok())
            .collect();

        if self.order == RecencyOrder::ScanPage {
            // Sort applies to the retrieved page only
            records.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
        }

        records.iter().map(SearchRecord::digest).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Duration};
    use serde_json::json;

    fn history() -> (Arc<MemoryStore>, SearchHistory) {
        let store = Arc::new(MemoryStore::new());
        let history = SearchHistory::new(store.clone());
        (store, history)
    }

    async fn seed_search(store: &MemoryStore, id: &str, query: &str, ts: DateTime<Utc>) {
        store
            .put(
                Collection::Searches,
                id,
                json!({
                    "search_id": id,
                    "query": query,
                    "results": [],
                    "timestamp": ts.to_rfc3339(),
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_search_returns_derived_id() {
        let (_, history) = history();
        let id = history.record_search("x", &[]).await.unwrap();
        assert!(!id.is_empty());
        assert!(id.starts_with("x_"));
    }

    #[tokio::test]
    async fn test_list_recent_projects_result_count() {
        let (_, history) = history();
        let results = vec![
            PaperRef { title: "A".into(), url: "https://arxiv.org/abs/1".into() },
            PaperRef { title: "B".into(), url: "https://arxiv.org/abs/2".into() },
        ];
        history.record_search("neural pruning", &results).await.unwrap();

        let digests = history.list_recent(10).await;
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].query, "neural pruning");
        assert_eq!(digests[0].result_count, 2);
    }

    #[tokio::test]
    async fn test_scan_page_sorts_retrieved_page_descending() {
        let (store, history) = history();
        let base = Utc::now();
        seed_search(&store, "a_1", "a", base - Duration::hours(2)).await;
        seed_search(&store, "b_1", "b", base).await;
        seed_search(&store, "c_1", "c", base - Duration::hours(1)).await;

        let digests = history.list_recent(10).await;
        assert_eq!(digests.len(), 3);
        assert_eq!(digests[0].query, "b");
        assert_eq!(digests[1].query, "c");
        assert_eq!(digests[2].query, "a");
    }

    #[tokio::test]
    async fn test_indexed_order_returns_true_newest() {
        let store = Arc::new(MemoryStore::new());
        let history = SearchHistory::with_order(store.clone(), RecencyOrder::Indexed);

        let base = Utc::now();
        seed_search(&store, "old_1", "old", base - Duration::days(3)).await;
        seed_search(&store, "newest_1", "newest", base).await;
        seed_search(&store, "mid_1", "mid", base - Duration::days(1)).await;

        let digests = history.list_recent(2).await;
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[0].query, "newest");
        assert_eq!(digests[1].query, "mid");
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty_listing() {
        let (store, history) = history();
        history.record_search("q", &[]).await.unwrap();

        store.set_failing(true);
        assert!(history.list_recent(10).await.is_empty());

        // The write path propagates instead
        assert!(history.record_search("q", &[]).await.is_err());
    }

    #[test]
    fn test_recency_order_from_config() {
        let mut config = HistoryConfig {
            recency_order: "indexed".into(),
            default_search_limit: 10,
            default_paper_limit: 20,
        };
        assert_eq!(RecencyOrder::from_config(&config), RecencyOrder::Indexed);

        config.recency_order = "scan-page".into();
        assert_eq!(RecencyOrder::from_config(&config), RecencyOrder::ScanPage);

        config.recency_order = "bogus".into();
        assert_eq!(RecencyOrder::from_config(&config), RecencyOrder::ScanPage);
    }
}
