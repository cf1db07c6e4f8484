//! Context assembly from retrieved chunks.
//!
//! Selects the top-k results above a similarity threshold and formats them
//! into a context string with numbered source citations.

use serde::{Deserialize, Serialize};

use super::store::{ChunkSearchResult, StoredChunk};
use crate::core::config::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBuilderConfig {
    /// Maximum number of chunks to include
    pub top_k: usize,
    /// Maximum total context length in characters
    pub max_context_length: usize,
    /// Whether to include source citations
    pub include_citations: bool,
    /// Similarity threshold (0.0-1.0)
    pub similarity_threshold: f64,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_context_length: 4000,
            include_citations: true,
            similarity_threshold: 0.3,
        }
    }
}

impl ContextBuilderConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.top_k,
            max_context_length: settings.max_context_length,
            include_citations: true,
            similarity_threshold: settings.similarity_threshold,
        }
    }
}

#[derive(Debug, Clone)]
struct ScoredChunk {
    chunk: StoredChunk,
    score: f64,
}

pub struct ContextBuilder {
    config: ContextBuilderConfig,
}

impl ContextBuilder {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextBuilderConfig {
        &self.config
    }

    /// Build a context string from store search results.
    pub fn build_context(&self, results: &[ChunkSearchResult]) -> String {
        let mut scored: Vec<ScoredChunk> = results
            .iter()
            .map(|r| ScoredChunk {
                chunk: r.chunk.clone(),
                score: r.score as f64,
            })
            .filter(|sc| sc.score >= self.config.similarity_threshold)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(self.config.top_k);

        self.format_context(&scored)
    }

    /// Keyword-scored context when no embeddings are available: the score is
    /// the fraction of query terms contained in the chunk.
    pub fn build_context_keyword(&self, chunks: &[StoredChunk], query: &str) -> String {
        if chunks.is_empty() {
            return String::new();
        }

        let query_lower = query.to_lowercase();
        let query_terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .map(|chunk| {
                let chunk_lower = chunk.content.to_lowercase();
                let score = query_terms
                    .iter()
                    .filter(|term| chunk_lower.contains(*term))
                    .count() as f64
                    / query_terms.len().max(1) as f64;

                ScoredChunk {
                    chunk: chunk.clone(),
                    score,
                }
            })
            .filter(|sc| sc.score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(self.config.top_k);

        self.format_context(&scored)
    }

    fn format_context(&self, scored: &[ScoredChunk]) -> String {
        if scored.is_empty() {
            return String::new();
        }

        let mut context = String::new();
        let mut current_length = 0;
        let max_length = self.config.max_context_length;

        for (i, sc) in scored.iter().enumerate() {
            let chunk_text = &sc.chunk.content;

            // Extra for citation formatting
            let addition_length = chunk_text.len() + 50;
            if current_length + addition_length > max_length {
                break;
            }

            if self.config.include_citations {
                context.push_str(&format!(
                    "[{}] (Source: {}, relevance: {:.2})\n{}\n\n",
                    i + 1,
                    sc.chunk.source,
                    sc.score,
                    chunk_text
                ));
            } else {
                context.push_str(chunk_text);
                context.push_str("\n\n");
            }

            current_length += addition_length;
        }

        context.trim().to_string()
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(ContextBuilderConfig::default())
    }
}
