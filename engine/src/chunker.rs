//! Greedy word-packing text chunker.
//!
//! Documents are split into bounded-size chunks before embedding. Words are
//! packed greedily: a chunk closes when the next word would push its joined
//! length past the limit and the chunk already holds something, so a word
//! longer than the limit still lands alone in its own chunk rather than
//! being truncated. Runs of whitespace collapse to single spaces; only the
//! semantic content matters for retrieval.

use serde::{Deserialize, Serialize};

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Deterministic word-packing splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSplitter {
    /// Maximum joined chunk length in characters.
    chunk_size: usize,
}

impl ChunkSplitter {
    /// Create a splitter with the given chunk size.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Split text into ordered chunks.
    ///
    /// Empty input yields no chunks; any other input yields at least one.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_size = 0;

        for word in text.split_whitespace() {
            // One extra character accounts for the joining space.
            let word_len = word.chars().count() + 1;

            if current_size + word_len > self.chunk_size && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_size = 0;
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_size += word_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        // Whitespace-only input has no words to pack; keep it as one chunk
        // so non-empty input never vanishes.
        if chunks.is_empty() {
            chunks.push(text.to_string());
        }

        chunks
    }
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
