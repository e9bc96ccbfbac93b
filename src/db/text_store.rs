use sqlx::SqlitePool;
use tracing::instrument;

use crate::error::AppResult;

/// Read-only access to the free-text snippets stored per title
///
/// Titles are matched exactly, with no case or whitespace normalization.
/// An unknown title is not an error: it yields an empty list.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextStore: Send + Sync {
    /// All snippets for every record sharing `title`, in store order
    async fn get_texts(&self, title: &str) -> AppResult<Vec<String>>;

    /// Distinct titles, sorted ascending
    async fn list_titles(&self) -> AppResult<Vec<String>>;
}

/// `TextStore` backed by the `movies` / `movie_texts` SQLite tables
#[derive(Clone)]
pub struct SqliteTextStore {
    pool: SqlitePool,
}

impl SqliteTextStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TextStore for SqliteTextStore {
    #[instrument(skip(self))]
    async fn get_texts(&self, title: &str) -> AppResult<Vec<String>> {
        let texts = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.txt
            FROM movie_texts t
            JOIN movies m ON m.item_id = t.item_id
            WHERE m.title = ?
            ORDER BY m.item_id, t.id
            "#,
        )
        .bind(title)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(texts = texts.len(), "Fetched texts for title");

        Ok(texts)
    }

    async fn list_titles(&self) -> AppResult<Vec<String>> {
        let titles =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT title FROM movies ORDER BY title")
                .fetch_all(&self.pool)
                .await?;

        Ok(titles)
    }
}
