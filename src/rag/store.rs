//! RagStore trait — abstract interface for the document index backend.
//!
//! The primary implementation is `SqliteRagStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored chunk with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source identifier (filename).
    pub source: String,
    /// Optional metadata (JSON), e.g. `start_offset`, `chunk_index`.
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Similarity score (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait RagStore: Send + Sync {
    /// Insert a chunk with its embedding vector.
    async fn insert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<(), ApiError>;

    /// Insert multiple chunks in batch.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError>;

    /// Search for chunks similar to the query embedding.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    /// Case-insensitive substring search over chunk contents, newest first.
    /// Used when no embedding endpoint is available.
    async fn text_search(&self, pattern: &str, limit: usize)
        -> Result<Vec<StoredChunk>, ApiError>;

    /// Delete all chunks for a source document.
    async fn delete_source(&self, source: &str) -> Result<usize, ApiError>;

    /// Get the total chunk count.
    async fn count(&self) -> Result<usize, ApiError>;

    /// The embedding model the stored vectors were computed with, if recorded.
    async fn embedding_model(&self) -> Result<Option<String>, ApiError>;

    /// Clear all data and record the embedding model.
    ///
    /// Used when the embedding model changes and all vectors are invalidated.
    async fn reindex_with_model(&self, embedding_model: &str) -> Result<(), ApiError>;
}
