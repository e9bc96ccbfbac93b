pub mod aggregate;
pub mod embedding;
pub mod recommendations;
pub mod similarity;

pub use embedding::{Embedder, OpenAiEmbedder};
pub use recommendations::{Recommender, OVERFETCH_MULTIPLIER};
pub use similarity::{PineconeIndex, SimilarityIndex};
