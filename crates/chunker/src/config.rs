use serde::{Deserialize, Serialize};

/// Default window size, in whitespace-separated words
pub const DEFAULT_CHUNK_WORDS: usize = 250;

/// Configuration for word-window chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Words per chunk (the last chunk may be shorter)
    pub chunk_size_words: usize,

    /// Words repeated at the start of the next chunk
    pub overlap_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size_words: DEFAULT_CHUNK_WORDS,
            overlap_words: 0,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub fn new(chunk_size_words: usize) -> Self {
        Self {
            chunk_size_words,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_overlap(mut self, overlap_words: usize) -> Self {
        self.overlap_words = overlap_words;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size_words == 0 {
            return Err("chunk_size_words must be > 0".to_string());
        }

        if self.overlap_words >= self.chunk_size_words {
            return Err(format!(
                "overlap_words ({}) must be smaller than chunk_size_words ({})",
                self.overlap_words, self.chunk_size_words
            ));
        }

        Ok(())
    }

    /// How far each window advances
    pub(crate) const fn step(&self) -> usize {
        self.chunk_size_words - self.overlap_words
    }
}
