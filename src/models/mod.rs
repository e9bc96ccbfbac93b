use serde::{Deserialize, Serialize};

pub mod imdb;

pub use imdb::{format_imdb_id, imdb_url, parse_external_id};

/// Embedding vector produced for a single text snippet
pub type Embedding = Vec<f32>;

/// Nearest-neighbour request sent to the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityQuery {
    pub vector: Embedding,
    /// Number of raw matches to fetch, before title deduplication
    pub top_k: usize,
    pub namespace: String,
    /// Records with this title are filtered out by the index
    pub exclude_title: String,
}

/// One ranked match returned by the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Vector record id inside the index
    pub id: String,
    pub title: String,
    /// Higher is more similar; scale is defined by the index metric
    pub score: f32,
    /// Zero-padded 7-digit IMDb id
    pub imdb_id: Option<String>,
    /// Internal store identifier (`movies.item_id`)
    pub item_id: Option<i64>,
}

/// A candidate that survived deduplication and truncation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub score: f32,
    pub imdb_id: Option<String>,
    pub item_id: Option<i64>,
}

impl From<Candidate> for Recommendation {
    fn from(candidate: Candidate) -> Self {
        Self {
            title: candidate.title,
            score: candidate.score,
            imdb_id: candidate.imdb_id,
            item_id: candidate.item_id,
        }
    }
}

impl Recommendation {
    /// IMDb page for this title, when the id is known
    pub fn imdb_url(&self) -> Option<String> {
        self.imdb_id.as_deref().map(imdb_url)
    }
}
