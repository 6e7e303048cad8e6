//! # RAG Chunker
//!
//! Splits plain text into fixed-size word windows before it is embedded.
//!
//! ```text
//! Text
//!     │
//!     ├──> split on whitespace
//!     │
//!     └──> windows of N words (optional overlap)
//!          └─> TextChunk { text, chunk_id, total_chunks }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ragdb_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(3)).unwrap();
//! let chunks = chunker.chunk_str("one two three four five").unwrap();
//!
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].text, "four five");
//! assert_eq!(chunks[1].chunk_id, 2);
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::Chunker;
pub use config::{ChunkerConfig, DEFAULT_CHUNK_WORDS};
pub use error::{ChunkerError, Result};
pub use types::TextChunk;
