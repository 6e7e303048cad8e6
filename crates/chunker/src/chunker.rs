use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::TextChunk;

/// Splits text into fixed-size word windows
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting invalid configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    /// Chunk text into windows of `chunk_size_words` whitespace-separated words.
    ///
    /// Whitespace inside a window is normalized to single spaces. Consecutive windows share
    /// `overlap_words` words; the final window ends at the last word.
    pub fn chunk_str(&self, content: &str) -> Result<Vec<TextChunk>> {
        let words: Vec<&str> = content.split_whitespace().collect();
        if words.is_empty() {
            return Err(ChunkerError::EmptyContent);
        }

        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.config.chunk_size_words).min(words.len());
            windows.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += self.config.step();
        }

        let total = windows.len();
        log::trace!("Chunked {} words into {total} chunks", words.len());
        Ok(windows
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextChunk::new(text, i + 1, total))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = Chunker::default().chunk_str("hello   brave\n\tnew world").unwrap();
        assert_eq!(chunks, vec![TextChunk::new("hello brave new world", 1, 1)]);
        assert!(chunks[0].is_last());
    }

    #[test]
    fn test_windows_and_numbering() {
        let chunker = Chunker::new(ChunkerConfig::new(250)).unwrap();
        let chunks = chunker.chunk_str(&words(600)).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].word_count(), 250);
        assert_eq!(chunks[1].word_count(), 250);
        assert_eq!(chunks[2].word_count(), 100);
        assert!(chunks[1].text.starts_with("w251 "));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, i + 1);
            assert_eq!(chunk.total_chunks, 3);
        }
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let chunker = Chunker::new(ChunkerConfig::new(5)).unwrap();
        let chunks = chunker.chunk_str(&words(10)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "w6 w7 w8 w9 w10");
    }

    #[test]
    fn test_overlap() {
        let chunker = Chunker::new(ChunkerConfig::new(4).with_overlap(2)).unwrap();
        let texts: Vec<String> = chunker
            .chunk_str(&words(8))
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["w1 w2 w3 w4", "w3 w4 w5 w6", "w5 w6 w7 w8"]);
    }

    #[test]
    fn test_empty_content() {
        let chunker = Chunker::default();
        assert_eq!(chunker.chunk_str(""), Err(ChunkerError::EmptyContent));
        assert_eq!(chunker.chunk_str(" \n\t "), Err(ChunkerError::EmptyContent));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Chunker::new(ChunkerConfig::new(3).with_overlap(5)).unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidConfig(_)));
    }
}
