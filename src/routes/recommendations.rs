use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::Recommendation,
    routes::AppState,
};

const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    /// Exact title as stored, e.g. "Toy Story (1995)"
    pub title: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    /// 1-based position in the ranking
    pub rank: usize,
    pub title: String,
    pub score: f32,
    pub imdb_id: Option<String>,
    pub imdb_url: Option<String>,
    pub item_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub title: String,
    /// False when nothing could be recommended, e.g. the title has no stored text
    pub found: bool,
    pub recommendations: Vec<RecommendationItem>,
}

impl RecommendationResponse {
    fn new(title: String, recommendations: Vec<Recommendation>) -> Self {
        let recommendations: Vec<RecommendationItem> = recommendations
            .into_iter()
            .enumerate()
            .map(|(idx, rec)| RecommendationItem {
                rank: idx + 1,
                imdb_url: rec.imdb_url(),
                title: rec.title,
                score: rec.score,
                imdb_id: rec.imdb_id,
                item_id: rec.item_id,
            })
            .collect();

        Self {
            title,
            found: !recommendations.is_empty(),
            recommendations,
        }
    }
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload?;

    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
    }
    if request.top_k == 0 || request.top_k > state.max_recommendations {
        return Err(AppError::InvalidInput(format!(
            "top_k must be between 1 and {}",
            state.max_recommendations
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %request.title,
        top_k = request.top_k,
        "Processing recommendation request"
    );

    let recommendations = state
        .recommender
        .recommend(&request.title, request.top_k)
        .await?;

    tracing::info!(
        request_id = %request_id,
        returned = recommendations.len(),
        "Recommendation request completed"
    );

    Ok(Json(RecommendationResponse::new(
        request.title,
        recommendations,
    )))
}
