use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::AppResult, routes::AppState};

/// Handler listing every title that can be used as a recommendation seed
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    let titles = state.recommender.text_store().list_titles().await?;
    tracing::debug!(titles = titles.len(), "Listed titles");
    Ok(Json(titles))
}
