//! # RAG Ingest
//!
//! Loads plain-text sources into a document store.
//!
//! ## Pipeline
//!
//! ```text
//! Files / raw text
//!     │
//!     ├──> SourceKind (extension, size limit, text extraction)
//!     │
//!     ├──> Chunker (word windows)
//!     │      └─> TextChunk[]
//!     │
//!     └──> DocumentStore::add (one document per chunk)
//!            └─> metadata: source, chunk_id, type, total_chunks
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ragdb_chunker::Chunker;
//! use ragdb_ingest::Ingestor;
//! use ragdb_vector_store::{DocumentStore, StubEmbedder};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = DocumentStore::open(384, "ragdb.json", Arc::new(StubEmbedder::new(384))).await?;
//!     let ingestor = Ingestor::new(Arc::new(store), Chunker::default());
//!
//!     let stats = ingestor.ingest_paths(&[PathBuf::from("README.md")]).await;
//!     println!("Stored {} chunks, {} errors", stats.documents_added, stats.errors.len());
//!     Ok(())
//! }
//! ```

mod error;
mod ingestor;
mod source;
mod stats;

pub use error::{IngestError, Result};
pub use ingestor::Ingestor;
pub use source::{decode_text, SourceKind};
pub use stats::IngestStats;
