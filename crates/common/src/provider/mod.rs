//! Search provider abstraction
//!
//! Provides a unified interface over the external web-search service:
//! - Free-text search returning {title, url} hits
//! - Question answering for summary generation
//!
//! Failures propagate unmodified; this layer performs no retries and no
//! fallback. The Tavily client is the production implementation; the mock
//! records call counts so tests can assert cache-hit behavior.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::errors::{AppError, Result};

/// One raw search result as returned by the provider. Titles arrive
/// untrimmed; normalization is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// Trait for external search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Free-text search returning up to `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Answer a question-style prompt with a short text response.
    async fn answer(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Tavily search client
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
}

impl TavilyProvider {
    /// Create a new Tavily client.
    pub fn new(api_key: String, base_url: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.tavily.com".to_string()),
        }
    }

    async fn request(&self, query: &str, max_results: usize, include_answer: bool)
        -> Result<TavilyResponse> {
        let url = format!("{}/search", self.base_url);

        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
            include_answer,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Provider {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::Provider {
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self.request(query, max_results, false).await?;
        Ok(response
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
            })
            .collect())
    }

    async fn answer(&self, prompt: &str) -> Result<String> {
        let response = self.request(prompt, 5, true).await?;
        response.answer.ok_or_else(|| AppError::Provider {
            message: "Provider returned no answer".to_string(),
        })
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

/// Mock provider for testing
///
/// Produces deterministic hits derived from the query and counts calls so
/// tests can assert that cache hits skip the provider entirely.
#[derive(Default)]
pub struct MockProvider {
    search_calls: AtomicUsize,
    answer_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn answer_calls(&self) -> usize {
        self.answer_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let slug: String = query
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();

        Ok((0..max_results)
            .map(|i| SearchHit {
                // Padded like real provider payloads; callers trim
                title: format!("  Paper {} on {} ", i + 1, query),
                url: format!("https://arxiv.org/abs/{}.{}", slug, i + 1),
            })
            .collect())
    }

    async fn answer(&self, prompt: &str) -> Result<String> {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Mock answer to: {}", prompt))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Create a search provider based on configuration.
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn SearchProvider> {
    match config.provider.as_str() {
        "tavily" => {
            let key = config
                .api_key
                .clone()
                .expect("Tavily API key required (provider.api_key)");
            Arc::new(TavilyProvider::new(
                key,
                config.api_base.clone(),
                config.timeout_secs,
            ))
        }
        "mock" => Arc::new(MockProvider::new()),
        other => {
            tracing::warn!(provider = other, "Unknown search provider, using mock");
            Arc::new(MockProvider::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_counts_calls() {
        let provider = MockProvider::new();
        assert_eq!(provider.search_calls(), 0);

        let hits = provider.search("neural pruning", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(provider.search_calls(), 1);

        let answer = provider.answer("What is pruning?").await.unwrap();
        assert!(answer.contains("What is pruning?"));
        assert_eq!(provider.answer_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_hits_are_untrimmed() {
        let provider = MockProvider::new();
        let hits = provider.search("sparsity", 1).await.unwrap();
        assert_ne!(hits[0].title, hits[0].title.trim());
        assert!(hits[0].url.starts_with("https://arxiv.org/abs/"));
    }

    #[test]
    fn test_tavily_request_serialization() {
        let request = TavilyRequest {
            api_key: "key",
            query: "site:arxiv.org pruning",
            max_results: 5,
            include_answer: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["query"], "site:arxiv.org pruning");
        assert_eq!(json["max_results"], 5);
        assert_eq!(json["include_answer"], true);
    }
}
