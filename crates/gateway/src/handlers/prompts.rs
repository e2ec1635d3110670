//! Prompt template and suggested topic handlers

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};

use paperscout_common::errors::{AppError, Result};
use paperscout_common::explorer;

#[derive(Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}

/// Query parameters for the exploration prompt
#[derive(Debug, Deserialize)]
pub struct ExploreTopicQuery {
    pub topic: String,
}

#[derive(Serialize)]
pub struct ExploreTopicResponse {
    pub topic: String,
    pub prompt: String,
}

/// Suggested research topics
pub async fn topics() -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: explorer::suggested_topics()
            .iter()
            .map(|t| t.to_string())
            .collect(),
    })
}

/// Build the four-step exploration prompt for a topic
pub async fn explore_topic(
    Query(params): Query<ExploreTopicQuery>,
) -> Result<Json<ExploreTopicResponse>> {
    if params.topic.trim().is_empty() {
        return Err(AppError::Validation {
            message: "Topic must not be empty".to_string(),
            field: Some("topic".to_string()),
        });
    }

    let prompt = explorer::explore_topic_prompt(&params.topic);

    Ok(Json(ExploreTopicResponse {
        topic: params.topic,
        prompt,
    }))
}
