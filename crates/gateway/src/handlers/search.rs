//! Search handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use paperscout_common::{
    errors::{AppError, Result},
    metrics,
};

/// Search request
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    /// Maximum results to return; defaults from configuration
    #[validate(range(min = 1, max = 20))]
    pub max_results: Option<usize>,
}

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchResultItem>,
    pub processing_time_ms: u64,
}

#[derive(Serialize)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
}

/// Search the provider and cache the results
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let max_results = request
        .max_results
        .unwrap_or(state.config.provider.default_max_results);

    let results = state.explorer.search_and_cache(&request.query, max_results).await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    // Record metrics
    metrics::record_search(processing_time_ms as f64 / 1000.0, results.len());

    tracing::info!(
        query = %request.query,
        results = results.len(),
        latency_ms = processing_time_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse {
        query: request.query,
        count: results.len(),
        results: results
            .into_iter()
            .map(|r| SearchResultItem {
                title: r.title,
                url: r.url,
            })
            .collect(),
        processing_time_ms,
    }))
}
