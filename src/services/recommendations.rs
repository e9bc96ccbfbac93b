use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::TextStore,
    error::{AppError, AppResult},
    models::{Candidate, Recommendation, SimilarityQuery},
    services::{aggregate::mean_vector, embedding::Embedder, similarity::SimilarityIndex},
};

/// Raw matches requested per wanted recommendation
///
/// The index holds one record per text snippet, so a popular title can fill
/// several slots of a ranked result; deduplication needs the headroom.
pub const OVERFETCH_MULTIPLIER: usize = 3;

/// Content-based movie recommender
///
/// Averages the embeddings of all texts stored for a title and asks the
/// vector index for the nearest other titles. Collaborators are injected so
/// each instance is independent and holds no mutable state.
#[derive(Clone)]
pub struct Recommender {
    text_store: Arc<dyn TextStore>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SimilarityIndex>,
    namespace: String,
}

impl Recommender {
    pub fn new(
        text_store: Arc<dyn TextStore>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SimilarityIndex>,
        namespace: String,
    ) -> Self {
        Self {
            text_store,
            embedder,
            index,
            namespace,
        }
    }

    pub fn text_store(&self) -> &Arc<dyn TextStore> {
        &self.text_store
    }

    /// Returns up to `desired_count` titles similar to `title`, best first
    ///
    /// An unknown title, or one without any stored text, yields an empty
    /// list rather than an error. Failures of the store, the embedding
    /// service or the index are propagated unchanged.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        title: &str,
        desired_count: usize,
    ) -> AppResult<Vec<Recommendation>> {
        if desired_count == 0 {
            return Err(AppError::InvalidInput(
                "Number of recommendations must be at least 1".to_string(),
            ));
        }

        let texts = self.text_store.get_texts(title).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch texts");
            e
        })?;

        if texts.is_empty() {
            tracing::info!("No texts stored for title, nothing to recommend");
            return Ok(Vec::new());
        }
        tracing::debug!(texts = texts.len(), "Texts fetched");

        let embeddings = self.embedder.embed(&texts).await.map_err(|e| {
            tracing::error!(error = %e, provider = self.embedder.name(), "Embedding failed");
            e
        })?;

        if embeddings.len() != texts.len() {
            return Err(AppError::EmbeddingService(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        tracing::debug!(embeddings = embeddings.len(), "Texts embedded");

        let vector = mean_vector(&embeddings)?;
        tracing::debug!(dimension = vector.len(), "Embeddings aggregated");

        let query = SimilarityQuery {
            vector,
            top_k: desired_count.saturating_mul(OVERFETCH_MULTIPLIER),
            namespace: self.namespace.clone(),
            exclude_title: title.to_string(),
        };

        let candidates = self.index.query(&query).await.map_err(|e| {
            tracing::error!(error = %e, index = self.index.name(), "Similarity query failed");
            e
        })?;
        tracing::debug!(candidates = candidates.len(), "Index queried");

        let recommendations = deduplicate(candidates, title, desired_count);

        tracing::info!(
            requested = desired_count,
            fetched_k = query.top_k,
            returned = recommendations.len(),
            "Recommendations generated"
        );

        Ok(recommendations)
    }
}

/// Keeps the first (highest-ranked) candidate per title, in input order
///
/// Stops once `desired_count` titles are admitted. The source title is
/// never admitted. Later duplicates do not count against the limit.
pub fn deduplicate(
    candidates: Vec<Candidate>,
    source_title: &str,
    desired_count: usize,
) -> Vec<Recommendation> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(source_title.to_string());

    let mut recommendations = Vec::with_capacity(desired_count.min(candidates.len()));
    for candidate in candidates {
        if recommendations.len() >= desired_count {
            break;
        }
        if seen.insert(candidate.title.clone()) {
            recommendations.push(Recommendation::from(candidate));
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::text_store::MockTextStore;
    use crate::services::embedding::MockEmbedder;
    use crate::services::similarity::MockSimilarityIndex;

    fn candidate(title: &str, score: f32) -> Candidate {
        Candidate {
            id: format!("{}-{}", title, score),
            title: title.to_string(),
            score,
            imdb_id: None,
            item_id: None,
        }
    }

    fn scored(recommendations: &[Recommendation]) -> Vec<(&str, f32)> {
        recommendations
            .iter()
            .map(|r| (r.title.as_str(), r.score))
            .collect()
    }

    fn store_with_texts(texts: Vec<&'static str>) -> MockTextStore {
        let mut store = MockTextStore::new();
        store
            .expect_get_texts()
            .withf(|title: &str| title == "Toy Story (1995)")
            .times(1)
            .returning(move |_| Ok(texts.iter().map(|t| t.to_string()).collect()));
        store
    }

    fn embedder_returning(vectors: Vec<Vec<f32>>) -> MockEmbedder {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .times(1)
            .returning(move |_| Ok(vectors.clone()));
        embedder.expect_name().return_const("mock");
        embedder
    }

    fn recommender(
        store: MockTextStore,
        embedder: MockEmbedder,
        index: MockSimilarityIndex,
    ) -> Recommender {
        Recommender::new(
            Arc::new(store),
            Arc::new(embedder),
            Arc::new(index),
            "namespace_until_1990".to_string(),
        )
    }

    #[test]
    fn test_deduplicate_drops_later_duplicates() {
        let candidates = vec![
            candidate("A", 0.9),
            candidate("B", 0.85),
            candidate("A", 0.8),
            candidate("C", 0.7),
        ];

        let result = deduplicate(candidates, "Source", 2);
        assert_eq!(scored(&result), vec![("A", 0.9), ("B", 0.85)]);
    }

    #[test]
    fn test_deduplicate_duplicate_not_counted_against_limit() {
        let candidates = vec![
            candidate("A", 0.9),
            candidate("A", 0.88),
            candidate("B", 0.85),
            candidate("C", 0.7),
        ];

        let result = deduplicate(candidates, "Source", 3);
        assert_eq!(scored(&result), vec![("A", 0.9), ("B", 0.85), ("C", 0.7)]);
    }

    #[test]
    fn test_deduplicate_preserves_order() {
        let candidates = vec![candidate("X", 0.95), candidate("Y", 0.9), candidate("Z", 0.8)];

        let result = deduplicate(candidates, "Source", 10);
        assert_eq!(scored(&result), vec![("X", 0.95), ("Y", 0.9), ("Z", 0.8)]);
    }

    #[test]
    fn test_deduplicate_underfill_is_not_an_error() {
        let candidates = vec![candidate("A", 0.9), candidate("A", 0.8)];
        assert_eq!(deduplicate(candidates, "Source", 5).len(), 1);
    }

    #[test]
    fn test_deduplicate_skips_source_title() {
        let candidates = vec![candidate("Source", 0.99), candidate("A", 0.9)];

        let result = deduplicate(candidates, "Source", 2);
        assert_eq!(scored(&result), vec![("A", 0.9)]);
    }

    #[tokio::test]
    async fn test_recommend_overfetches_three_times() {
        let store = store_with_texts(vec!["toys come to life", "buzz and woody"]);
        let embedder = embedder_returning(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        let mut index = MockSimilarityIndex::new();
        index
            .expect_query()
            .withf(|query: &SimilarityQuery| {
                query.top_k == 15
                    && query.namespace == "namespace_until_1990"
                    && query.exclude_title == "Toy Story (1995)"
                    && query.vector == vec![0.5, 0.5]
            })
            .times(1)
            .returning(|_| Ok(vec![candidate("Aladdin (1992)", 0.9)]));
        index.expect_name().return_const("mock");

        let result = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", 5)
            .await
            .unwrap();

        assert_eq!(scored(&result), vec![("Aladdin (1992)", 0.9)]);
    }

    #[test]
    fn test_deduplicate_huge_count_returns_all_distinct() {
        let candidates = vec![candidate("A", 0.9), candidate("A", 0.8), candidate("B", 0.7)];

        let result = deduplicate(candidates, "Source", usize::MAX);
        assert_eq!(scored(&result), vec![("A", 0.9), ("B", 0.7)]);
    }

    #[tokio::test]
    async fn test_recommend_huge_count_saturates_overfetch() {
        let store = store_with_texts(vec!["toys come to life"]);
        let embedder = embedder_returning(vec![vec![1.0, 0.0]]);

        let mut index = MockSimilarityIndex::new();
        index
            .expect_query()
            .withf(|query: &SimilarityQuery| query.top_k == usize::MAX)
            .times(1)
            .returning(|_| Ok(vec![candidate("A", 0.9), candidate("A", 0.8)]));
        index.expect_name().return_const("mock");

        let result = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", usize::MAX / 2)
            .await
            .unwrap();

        assert_eq!(scored(&result), vec![("A", 0.9)]);
    }

    #[tokio::test]
    async fn test_recommend_dedups_and_truncates() {
        let store = store_with_texts(vec!["toys come to life"]);
        let embedder = embedder_returning(vec![vec![0.2, 0.4]]);

        let mut index = MockSimilarityIndex::new();
        index.expect_query().times(1).returning(|_| {
            Ok(vec![
                candidate("A", 0.9),
                candidate("B", 0.85),
                candidate("A", 0.8),
                candidate("C", 0.7),
            ])
        });
        index.expect_name().return_const("mock");

        let result = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", 2)
            .await
            .unwrap();

        assert_eq!(scored(&result), vec![("A", 0.9), ("B", 0.85)]);
    }

    #[tokio::test]
    async fn test_recommend_unknown_title_is_empty() {
        let mut store = MockTextStore::new();
        store.expect_get_texts().times(1).returning(|_| Ok(vec![]));

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().times(0);
        let mut index = MockSimilarityIndex::new();
        index.expect_query().times(0);

        let result = recommender(store, embedder, index)
            .recommend("Nonexistent (1900)", 10)
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_recommend_embedding_failure_skips_query() {
        let store = store_with_texts(vec!["toys come to life"]);

        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .times(1)
            .returning(|_| Err(AppError::EmbeddingService("rate limited".to_string())));
        embedder.expect_name().return_const("mock");

        let mut index = MockSimilarityIndex::new();
        index.expect_query().times(0);

        let err = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_recommend_query_failure_propagates() {
        let store = store_with_texts(vec!["toys come to life"]);
        let embedder = embedder_returning(vec![vec![1.0]]);

        let mut index = MockSimilarityIndex::new();
        index
            .expect_query()
            .times(1)
            .returning(|_| Err(AppError::QueryService("unreachable".to_string())));
        index.expect_name().return_const("mock");

        let err = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QueryService(_)));
    }

    #[tokio::test]
    async fn test_recommend_store_failure_propagates() {
        let mut store = MockTextStore::new();
        store
            .expect_get_texts()
            .times(1)
            .returning(|_| Err(AppError::StoreUnavailable(sqlx::Error::PoolClosed)));

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().times(0);
        let mut index = MockSimilarityIndex::new();
        index.expect_query().times(0);

        let err = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_recommend_embedding_count_mismatch() {
        let store = store_with_texts(vec!["one", "two"]);
        let embedder = embedder_returning(vec![vec![1.0]]);

        let mut index = MockSimilarityIndex::new();
        index.expect_query().times(0);

        let err = recommender(store, embedder, index)
            .recommend("Toy Story (1995)", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_recommend_rejects_zero_count() {
        let mut store = MockTextStore::new();
        store.expect_get_texts().times(0);

        let err = recommender(store, MockEmbedder::new(), MockSimilarityIndex::new())
            .recommend("Toy Story (1995)", 0)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
