use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_recs_api::{
    config::Config,
    db::{create_pool, SqliteTextStore},
    routes::{create_router, AppState},
    services::{OpenAiEmbedder, PineconeIndex, Recommender},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recs_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    tracing::info!(database_url = %config.database_url, "Connected to text store");

    // One client, shared by both remote services, carrying the timeout policy
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;

    let embedder = OpenAiEmbedder::new(
        http_client.clone(),
        config.openai_api_key.clone(),
        config.embedding_api_url.clone(),
        config.embedding_model.clone(),
        config.embedding_batch_size,
    );
    let index = PineconeIndex::new(
        http_client,
        config.pinecone_api_key.clone(),
        config.pinecone_index_host.clone(),
    );

    let recommender = Recommender::new(
        Arc::new(SqliteTextStore::new(pool)),
        Arc::new(embedder),
        Arc::new(index),
        config.namespace.clone(),
    );

    let state = Arc::new(AppState::new(recommender, config.max_recommendations));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %config.bind_address(),
        namespace = %config.namespace,
        model = %config.embedding_model,
        "Server running"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
