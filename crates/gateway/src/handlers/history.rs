//! Search history handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Query parameters for the search history listing
#[derive(Debug, Deserialize)]
pub struct ListSearchesQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchDigestItem {
    pub search_id: String,
    pub query: String,
    pub timestamp: String,
    pub result_count: usize,
}

#[derive(Serialize)]
pub struct ListSearchesResponse {
    pub count: usize,
    pub searches: Vec<SearchDigestItem>,
}

/// List recent searches
pub async fn list_searches(
    State(state): State<AppState>,
    Query(params): Query<ListSearchesQuery>,
) -> Json<ListSearchesResponse> {
    let limit = params
        .limit
        .unwrap_or(state.config.history.default_search_limit);

    let searches = state.explorer.recent_searches(limit).await;

    Json(ListSearchesResponse {
        count: searches.len(),
        searches: searches
            .into_iter()
            .map(|s| SearchDigestItem {
                search_id: s.search_id,
                query: s.query,
                timestamp: s.timestamp.to_rfc3339(),
                result_count: s.result_count,
            })
            .collect(),
    })
}
