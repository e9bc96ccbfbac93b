use crate::services::Recommender;

/// Shared, read-only application state
pub struct AppState {
    pub recommender: Recommender,
    /// Largest `top_k` a client may request
    pub max_recommendations: usize,
}

impl AppState {
    pub fn new(recommender: Recommender, max_recommendations: usize) -> Self {
        Self {
            recommender,
            max_recommendations,
        }
    }
}
