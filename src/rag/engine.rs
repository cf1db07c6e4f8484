//! Text chunking for the document index.
//!
//! Files are split into overlapping chunks, preferring sentence boundaries
//! near the end of each chunk.

use serde::{Deserialize, Serialize};

use crate::core::config::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks
    pub chunk_overlap: usize,
    /// Maximum chunks per source
    pub max_chunks: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            max_chunks: 200,
        }
    }
}

impl RagConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            max_chunks: settings.max_chunks_per_file,
        }
    }
}

/// A text chunk with source information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// Source identifier (filename)
    pub source: String,
    /// Character offset in the original document
    pub start_offset: usize,
    /// Chunk index within the source
    pub chunk_index: usize,
}

pub struct Chunker {
    config: RagConfig,
}

impl Chunker {
    pub fn new(config: RagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Split text into overlapping chunks.
    pub fn split(&self, text: &str, source: &str) -> Vec<TextChunk> {
        let chunk_size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let max_chunks = self.config.max_chunks;

        let mut chunks = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();

        if total_chars == 0 {
            return chunks;
        }

        let step = chunk_size.saturating_sub(overlap).max(1);
        let mut start = 0;
        let mut chunk_index = 0;

        while start < total_chars && chunks.len() < max_chunks {
            let end = (start + chunk_size).min(total_chars);
            let chunk_text: String = chars[start..end].iter().collect();

            let final_text = if end < total_chars {
                trim_to_sentence_boundary(&chunk_text)
            } else {
                chunk_text
            };

            chunks.push(TextChunk {
                text: final_text.trim().to_string(),
                source: source.to_string(),
                start_offset: start,
                chunk_index,
            });

            start += step;
            chunk_index += 1;
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(RagConfig::default())
    }
}

/// Cut the chunk at the last sentence ending in its final stretch, when one exists.
fn trim_to_sentence_boundary(text: &str) -> String {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    // Only search the last 20% so short chunks are not gutted.
    let mut search_start = (text.len() * 80) / 100;
    while search_start > 0 && !text.is_char_boundary(search_start) {
        search_start -= 1;
    }
    let search_text = &text[search_start..];

    for ending in sentence_endings.iter() {
        if let Some(pos) = search_text.rfind(ending) {
            let cut_pos = search_start + pos + ending.len();
            return text[..cut_pos].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_with_overlap_and_limit() {
        let chunker = Chunker::new(RagConfig {
            chunk_size: 100,
            chunk_overlap: 20,
            max_chunks: 10,
        });

        let text = "This is a test. ".repeat(200);
        let chunks = chunker.split(&text, "test.txt");

        assert!(!chunks.is_empty());
        assert_eq!(chunks.len(), 10);
        assert_eq!(chunks[0].source, "test.txt");
        assert_eq!(chunks[1].start_offset, 80);
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.split("", "empty.txt").is_empty());
    }

    #[test]
    fn chunks_end_at_sentence_boundaries() {
        let chunker = Chunker::new(RagConfig {
            chunk_size: 50,
            chunk_overlap: 10,
            max_chunks: 100,
        });

        let text = "One sentence here. Another sentence follows. And one more to be safe. Plus a trailing tail that keeps going.";
        let chunks = chunker.split(text, "doc");

        assert!(chunks.len() > 1);
        assert!(chunks[0].text.ends_with('.'));
    }

    #[test]
    fn step_never_stalls_when_overlap_exceeds_size() {
        let chunker = Chunker::new(RagConfig {
            chunk_size: 10,
            chunk_overlap: 50,
            max_chunks: 1000,
        });

        let chunks = chunker.split(&"x".repeat(100), "doc");
        // Step clamps to 1, so this terminates and covers the text.
        assert!(chunks.len() <= 1000);
        assert!(!chunks.is_empty());
    }
}
