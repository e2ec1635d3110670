//! Paper handlers: summarization and the saved papers listing

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use paperscout_common::errors::{AppError, Result};

/// Request to summarize a paper
#[derive(Debug, Deserialize, Validate)]
pub struct SummarizeRequest {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
}

/// Response carrying the (possibly cached) summary
#[derive(Serialize)]
pub struct SummarizeResponse {
    pub url: String,
    pub summary: String,
}

/// Query parameters for the saved papers listing
#[derive(Debug, Deserialize)]
pub struct ListPapersQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SavedPaperItem {
    pub title: String,
    pub url: String,
    pub has_summary: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ListPapersResponse {
    pub count: usize,
    pub papers: Vec<SavedPaperItem>,
}

/// Return a summary for the paper, generating and caching one on a miss
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("url".to_string()),
    })?;

    let summary = state.explorer.summarize(&request.url).await?;

    Ok(Json(SummarizeResponse {
        url: request.url,
        summary,
    }))
}

/// List saved papers
pub async fn list_papers(
    State(state): State<AppState>,
    Query(params): Query<ListPapersQuery>,
) -> Json<ListPapersResponse> {
    let limit = params
        .limit
        .unwrap_or(state.config.history.default_paper_limit);

    let papers = state.explorer.saved_papers(limit).await;

    Json(ListPapersResponse {
        count: papers.len(),
        papers: papers
            .into_iter()
            .map(|p| SavedPaperItem {
                title: p.title,
                url: p.url,
                has_summary: p.has_summary,
                timestamp: p.timestamp.to_rfc3339(),
            })
            .collect(),
    })
}
