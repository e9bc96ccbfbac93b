pub mod sqlite;
pub mod text_store;

pub use sqlite::create_pool;
pub use text_store::{SqliteTextStore, TextStore};
