//! Embedding provider abstraction
//!
//! Turns text snippets into fixed-length vectors. The production binding
//! talks to the OpenAI embeddings endpoint; tests substitute doubles.

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::Embedding,
};

/// Converts texts into embedding vectors, one per input, order-preserving
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Embedding>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Embedding,
}

/// OpenAI embeddings client
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        http_client: HttpClient,
        api_key: String,
        api_url: String,
        model: String,
        batch_size: usize,
    ) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            batch_size: batch_size.max(1),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one embeddings request and returns vectors in input order
    async fn embed_chunk(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        let url = format!("{}/embeddings", self.api_url);
        let payload = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingService(format!(
                "OpenAI API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::EmbeddingService(format!("Failed to read response: {}", e)))?;

        let parsed: EmbeddingResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize embeddings response");
            AppError::EmbeddingService(format!("Failed to parse embeddings response: {}", e))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(AppError::EmbeddingService(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut data = parsed.data;
        data.sort_by_key(|item| item.index);

        if data.iter().enumerate().any(|(position, item)| item.index != position) {
            return Err(AppError::EmbeddingService(
                "Embeddings response has duplicate or out-of-range indices".to_string(),
            ));
        }

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, texts), fields(texts = texts.len()))]
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_chunk(chunk).await?);
        }

        if let Some(first) = embeddings.first() {
            let dimension = first.len();
            if dimension == 0 || embeddings.iter().any(|e| e.len() != dimension) {
                return Err(AppError::EmbeddingService(
                    "Embeddings have inconsistent dimensions".to_string(),
                ));
            }
        }

        tracing::debug!(
            embeddings = embeddings.len(),
            provider = self.name(),
            model = self.model(),
            "Embeddings generated"
        );

        Ok(embeddings)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
