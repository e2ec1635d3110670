//! Explorer facade
//!
//! The externally callable surface: search-and-cache, read-through
//! summarization, and the two history listings, composed over the paper
//! catalog, the search history, and the external search provider.
//!
//! Side-effect ordering in `search_and_cache` is part of the contract:
//! paper writes happen before the search record is written, and there is no
//! transactional atomicity across the two collections. Summarization adds a
//! per-url single-flight guard so concurrent callers for the same paper
//! share one provider computation instead of issuing duplicates.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::catalog::PaperCatalog;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::history::{RecencyOrder, SearchHistory};
use crate::metrics;
use crate::provider::SearchProvider;
use crate::records::{PaperRef, SavedPaper, SearchDigest};
use crate::store::RecordStore;

/// Suggested research topics, served as a static resource.
pub const SUGGESTED_TOPICS: [&str; 6] = [
    "Transformer interpretability",
    "Efficient large-scale model training",
    "Federated learning privacy",
    "Neural network pruning",
    "Multi-modal AI systems",
    "AI safety and alignment",
];

/// Facade composing cache, history, and the search provider.
pub struct Explorer {
    provider: Arc<dyn SearchProvider>,
    catalog: PaperCatalog,
    history: SearchHistory,
    search_domain: String,
    /// Per-url guards for in-flight summary computations
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Explorer {
    /// Build the facade from explicitly passed-in dependencies.
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn SearchProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog: PaperCatalog::new(store.clone()),
            history: SearchHistory::with_order(store, RecencyOrder::from_config(&config.history)),
            provider,
            search_domain: config.provider.search_domain.clone(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Search the provider scoped to the configured domain, cache each hit
    /// as a paper record, append the invocation to the search history, and
    /// return the result snapshot.
    ///
    /// Caching a hit writes title only; by the catalog's full-replace
    /// semantics this erases any summary previously attached to a url that
    /// reappears in a later search. Individual paper-write failures are
    /// logged and skipped; the search record is still written with the full
    /// intended result set.
    pub async fn search_and_cache(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<PaperRef>> {
        let scoped = format!("site:{} {}", self.search_domain, query);
        info!(query, max_results, provider = self.provider.name(), "Searching");

        let hits = match self.provider.search(&scoped, max_results).await {
            Ok(hits) => {
                metrics::record_provider("search", true);
                hits
            }
            Err(e) => {
                metrics::record_provider("search", false);
                return Err(e);
            }
        };

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let paper = PaperRef {
                title: hit.title.trim().to_string(),
                url: hit.url,
            };

            if let Err(e) = self.catalog.save_paper(&paper.title, &paper.url, None).await {
                warn!(url = %paper.url, error = %e, "Failed to cache paper from search");
            }

            results.push(paper);
        }

        let search_id = self.history.record_search(query, &results).await?;
        info!(search_id = %search_id, results = results.len(), "Search recorded");

        Ok(results)
    }

    /// Return a summary for the paper at `url`, computing and caching one
    /// when no non-empty summary is stored.
    ///
    /// No negative caching: a record with an absent or empty summary is
    /// recomputed on every request. Provider failures propagate; nothing is
    /// retried.
    pub async fn summarize(&self, url: &str) -> Result<String> {
        if let Some(summary) = self.cached_summary(url).await {
            metrics::record_cache(true, "summary");
            info!(url, "Summary served from cache");
            return Ok(summary);
        }

        let guard = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _permit = guard.lock().await;

            // A caller that held the guard before us may have stored the
            // summary already
            if let Some(summary) = self.cached_summary(url).await {
                metrics::record_cache(true, "summary");
                Ok(summary)
            } else {
                metrics::record_cache(false, "summary");
                self.compute_summary(url).await
            }
        };

        self.inflight.lock().await.remove(url);
        result
    }

    async fn cached_summary(&self, url: &str) -> Option<String> {
        self.catalog
            .get_paper(url)
            .await
            .and_then(|paper| paper.summary)
            .filter(|s| !s.is_empty())
    }

    async fn compute_summary(&self, url: &str) -> Result<String> {
        let prompt = format!("Summarize the key contributions of this ArXiv paper: {url}");

        let summary = match self.provider.answer(&prompt).await {
            Ok(summary) => {
                metrics::record_provider("answer", true);
                summary
            }
            Err(e) => {
                metrics::record_provider("answer", false);
                return Err(e);
            }
        };

        self.catalog.attach_summary(url, &summary).await?;
        info!(url, "Summary generated and cached");
        Ok(summary)
    }

    /// Recent search digests, per the configured recency semantics.
    pub async fn recent_searches(&self, limit: usize) -> Vec<SearchDigest> {
        self.history.list_recent(limit).await
    }

    /// Saved paper views, in store order.
    pub async fn saved_papers(&self, limit: usize) -> Vec<SavedPaper> {
        self.catalog.list_saved(limit).await
    }
}

/// Build the four-step exploration procedure prompt for a topic.
///
/// Pure function, no state.
pub fn explore_topic_prompt(topic: &str) -> String {
    format!(
        "I want to explore recent work on '{topic}'.\n\
         1. Call 'search' to find the 5 most recent papers.\n\
         2. For each paper URL, call 'summarize' to extract key contributions.\n\
         3. Use 'recent searches' to see if we've explored similar topics.\n\
         4. Combine all information into a comprehensive overview report."
    )
}

/// Static list of suggested research topics.
pub fn suggested_topics() -> &'static [&'static str] {
    &SUGGESTED_TOPICS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::store::MemoryStore;

    fn explorer() -> (Arc<MemoryStore>, Arc<MockProvider>, Explorer) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::new());
        let config = AppConfig::default();
        let explorer = Explorer::new(store.clone(), provider.clone(), &config);
        (store, provider, explorer)
    }

    #[tokio::test]
    async fn test_search_trims_titles_and_caches_papers() {
        let (_, _, explorer) = explorer();

        let results = explorer.search_and_cache("x", 3).await.unwrap();
        assert_eq!(results.len(), 3);
        for paper in &results {
            assert_eq!(paper.title, paper.title.trim());
        }

        let saved = explorer.saved_papers(20).await;
        for paper in &results {
            assert!(saved.iter().any(|s| s.url == paper.url));
        }
    }

    #[tokio::test]
    async fn test_search_then_history_digest() {
        let (_, _, explorer) = explorer();

        let results = explorer.search_and_cache("neural pruning", 2).await.unwrap();
        assert_eq!(results.len(), 2);

        let recent = explorer.recent_searches(1).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].query, "neural pruning");
        assert_eq!(recent[0].result_count, 2);
    }

    #[tokio::test]
    async fn test_summarize_is_cached_after_first_call() {
        let (_, provider, explorer) = explorer();
        let url = "https://arxiv.org/abs/1803.03635";

        let first = explorer.summarize(url).await.unwrap();
        assert_eq!(provider.answer_calls(), 1);

        let second = explorer.summarize(url).await.unwrap();
        assert_eq!(provider.answer_calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_summarize_unknown_paper_creates_placeholder() {
        let (_, _, explorer) = explorer();
        let url = "https://arxiv.org/abs/2101.00001";

        explorer.summarize(url).await.unwrap();

        let saved = explorer.saved_papers(20).await;
        let entry = saved.iter().find(|s| s.url == url).unwrap();
        assert_eq!(entry.title, crate::PLACEHOLDER_TITLE);
        assert!(entry.has_summary);
    }

    #[tokio::test]
    async fn test_rediscovery_erases_cached_summary() {
        let (_, provider, explorer) = explorer();

        let results = explorer.search_and_cache("sparsity", 1).await.unwrap();
        let url = results[0].url.clone();

        explorer.summarize(&url).await.unwrap();
        assert_eq!(provider.answer_calls(), 1);

        // Same query returns the same url; caching the hit writes title only
        explorer.search_and_cache("sparsity", 1).await.unwrap();

        // The summary was erased, so the next summarize recomputes
        explorer.summarize(&url).await.unwrap();
        assert_eq!(provider.answer_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_summarize_shares_one_provider_call() {
        let (_, provider, explorer) = explorer();
        let url = "https://arxiv.org/abs/1706.03762";

        let (a, b) = tokio::join!(explorer.summarize(url), explorer.summarize(url));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.answer_calls(), 1);
    }

    #[test]
    fn test_explore_topic_prompt_embeds_topic() {
        let prompt = explore_topic_prompt("neural pruning");
        assert!(prompt.contains("'neural pruning'"));
        assert!(prompt.contains("1."));
        assert!(prompt.contains("4."));
    }

    #[test]
    fn test_suggested_topics_is_static_and_nonempty() {
        let topics = suggested_topics();
        assert!(!topics.is_empty());
        assert!(topics.contains(&"Neural network pruning"));
    }
}
