use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite URL of the title/text store
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// OpenAI API key used for embeddings
    pub openai_api_key: String,

    /// Embeddings API base URL
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    /// Embedding model name; must match the model used to build the index
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Maximum number of texts sent in a single embeddings request
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Pinecone API key
    pub pinecone_api_key: String,

    /// Pinecone index data-plane host, e.g. `https://movies-abc123.svc.pinecone.io`
    pub pinecone_index_host: String,

    /// Vector index namespace holding the movie embeddings
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest `top_k` accepted by the HTTP API
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_url() -> String {
    "sqlite://data/movies.db".to_string()
}

fn default_embedding_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_batch_size() -> usize {
    50
}

fn default_namespace() -> String {
    "namespace_until_1990".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_recommendations() -> usize {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.embedding_batch_size == 0 {
            anyhow::bail!("EMBEDDING_BATCH_SIZE must be at least 1");
        }
        if config.max_recommendations == 0 {
            anyhow::bail!("MAX_RECOMMENDATIONS must be at least 1");
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
