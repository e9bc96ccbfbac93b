//! Vector index abstraction
//!
//! The index stores one vector per text snippet together with the title
//! metadata, so several records may share a title. Callers over-fetch and
//! deduplicate; this layer only issues the ranked query.

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{format_imdb_id, parse_external_id, Candidate, SimilarityQuery},
};

/// Nearest-neighbour search over the movie embeddings
///
/// Implementations must return matches ranked by descending score and must
/// never return records whose title equals `query.exclude_title`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn query(&self, query: &SimilarityQuery) -> AppResult<Vec<Candidate>>;

    /// Index name for logging and debugging
    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    filter: Value,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl QueryMatch {
    /// Converts a raw match; matches without a title cannot be deduplicated and are dropped
    fn into_candidate(self) -> Option<Candidate> {
        let title = self
            .metadata
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?
            .to_string();

        let imdb_id = format_imdb_id(parse_external_id(self.metadata.get("imdb_id")));
        let item_id = self.metadata.get("item_id").and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        });

        Some(Candidate {
            id: self.id,
            title,
            score: self.score,
            imdb_id,
            item_id,
        })
    }
}

/// Pinecone data-plane client for a single index
#[derive(Clone)]
pub struct PineconeIndex {
    http_client: HttpClient,
    api_key: String,
    index_host: String,
}

impl PineconeIndex {
    pub fn new(http_client: HttpClient, api_key: String, index_host: String) -> Self {
        let index_host = index_host.trim_end_matches('/');
        let index_host = if index_host.starts_with("http://") || index_host.starts_with("https://")
        {
            index_host.to_string()
        } else {
            format!("https://{}", index_host)
        };

        Self {
            http_client,
            api_key,
            index_host,
        }
    }

    /// Metadata filter removing every record of the source title
    fn exclude_title_filter(title: &str) -> Value {
        json!({ "title": { "$ne": title } })
    }
}

#[async_trait::async_trait]
impl SimilarityIndex for PineconeIndex {
    #[instrument(skip(self, query), fields(top_k = query.top_k, namespace = %query.namespace))]
    async fn query(&self, query: &SimilarityQuery) -> AppResult<Vec<Candidate>> {
        let url = format!("{}/query", self.index_host);
        let payload = QueryRequest {
            vector: &query.vector,
            top_k: query.top_k,
            namespace: &query.namespace,
            filter: Self::exclude_title_filter(&query.exclude_title),
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .http_client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::QueryService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::QueryService(format!(
                "Pinecone returned status {}: {}",
                status, body
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::QueryService(format!("Failed to read response: {}", e)))?;

        let parsed: QueryResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize Pinecone query response");
            AppError::QueryService(format!("Failed to parse query response: {}", e))
        })?;

        let raw_matches = parsed.matches.len();
        let candidates: Vec<Candidate> = parsed
            .matches
            .into_iter()
            .filter_map(QueryMatch::into_candidate)
            .collect();

        if candidates.len() < raw_matches {
            tracing::warn!(
                dropped = raw_matches - candidates.len(),
                "Dropped matches without a title"
            );
        }

        tracing::debug!(
            candidates = candidates.len(),
            index = self.name(),
            "Similarity query completed"
        );

        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}
