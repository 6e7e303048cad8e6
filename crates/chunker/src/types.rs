use serde::{Deserialize, Serialize};

/// One window of a chunked text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Words of the window joined by single spaces
    pub text: String,

    /// Position of this chunk, starting at 1
    pub chunk_id: usize,

    /// Number of chunks the source text produced
    pub total_chunks: usize,
}

impl TextChunk {
    pub fn new(text: impl Into<String>, chunk_id: usize, total_chunks: usize) -> Self {
        Self {
            text: text.into(),
            chunk_id,
            total_chunks,
        }
    }

    /// Number of words in this chunk
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.chunk_id == self.total_chunks
    }
}
