pub mod context_builder;
pub mod engine;
pub mod indexer;
pub mod sqlite;
pub mod store;

pub use context_builder::{ContextBuilder, ContextBuilderConfig};
pub use engine::{Chunker, RagConfig, TextChunk};
pub use indexer::{IndexReport, Indexer};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
