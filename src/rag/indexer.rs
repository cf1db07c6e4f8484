//! Directory indexer: reads files from the document directory, chunks them,
//! embeds the chunks in batches, and persists everything into the store.

use std::path::Path;

use serde_json::json;

use super::engine::Chunker;
use super::store::{RagStore, StoredChunk};
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Default)]
pub struct IndexReport {
    pub files: usize,
    pub skipped: usize,
    pub chunks: usize,
}

pub struct Indexer<'a> {
    chunker: Chunker,
    provider: &'a dyn LlmProvider,
    store: &'a dyn RagStore,
    embedding_model: String,
}

impl<'a> Indexer<'a> {
    pub fn new(
        chunker: Chunker,
        provider: &'a dyn LlmProvider,
        store: &'a dyn RagStore,
        embedding_model: String,
    ) -> Self {
        Self {
            chunker,
            provider,
            store,
            embedding_model,
        }
    }

    /// Index every regular file in `dir` (non-recursive).
    ///
    /// Stored vectors are only comparable when computed with one model, so a
    /// model change wipes the store before indexing.
    pub async fn index_dir(&self, dir: &Path) -> Result<IndexReport, ApiError> {
        if !dir.is_dir() {
            return Err(ApiError::NotFound(format!(
                "document directory {}",
                dir.display()
            )));
        }

        match self.store.embedding_model().await? {
            Some(previous) if previous != self.embedding_model => {
                tracing::warn!(
                    "Embedding model changed ({} -> {}), clearing index",
                    previous,
                    self.embedding_model
                );
                self.store.reindex_with_model(&self.embedding_model).await?;
            }
            None => {
                self.store.reindex_with_model(&self.embedding_model).await?;
            }
            _ => {}
        }

        let mut report = IndexReport::default();

        let mut entries = tokio::fs::read_dir(dir).await.map_err(ApiError::internal)?;
        while let Some(entry) = entries.next_entry().await.map_err(ApiError::internal)? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!("Skipping {} (not readable as text): {}", source, err);
                    report.skipped += 1;
                    continue;
                }
            };

            let chunks = self.chunker.split(&text, &source);
            if chunks.is_empty() {
                report.skipped += 1;
                continue;
            }

            // Re-indexing the same file replaces its old chunks.
            self.store.delete_source(&source).await?;

            let inserted = self.index_chunks(&chunks).await?;
            tracing::info!("Indexed {} ({} chunks)", source, inserted);

            report.files += 1;
            report.chunks += inserted;
        }

        Ok(report)
    }

    async fn index_chunks(&self, chunks: &[super::engine::TextChunk]) -> Result<usize, ApiError> {
        let mut inserted = 0;

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let inputs: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.provider.embed(&inputs, &self.embedding_model).await?;

            if embeddings.len() != batch.len() {
                return Err(ApiError::Internal(format!(
                    "embedding count mismatch: {} inputs, {} vectors",
                    batch.len(),
                    embeddings.len()
                )));
            }

            let items: Vec<(StoredChunk, Vec<f32>)> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| {
                    (
                        StoredChunk {
                            chunk_id: uuid::Uuid::new_v4().to_string(),
                            content: chunk.text.clone(),
                            source: chunk.source.clone(),
                            metadata: Some(json!({
                                "start_offset": chunk.start_offset,
                                "chunk_index": chunk.chunk_index,
                                "indexed_at": chrono::Utc::now().to_rfc3339(),
                            })),
                        },
                        embedding,
                    )
                })
                .collect();

            inserted += items.len();
            self.store.insert_batch(items).await?;
        }

        Ok(inserted)
    }
}
