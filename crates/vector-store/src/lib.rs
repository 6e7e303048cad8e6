//! # RAG Vector Store
//!
//! Embedded document store with exact nearest-neighbor search, built for
//! retrieval-augmented generation.
//!
//! ## Features
//!
//! - **Exact search** by squared Euclidean distance over a dense in-memory index
//! - **Pluggable embeddings** via [`EmbeddingProvider`] (deterministic stub or
//!   OpenAI-compatible HTTP endpoint)
//! - **Atomic snapshots**: single JSON file, written via temp file and rename
//! - **Rebuild on delete/update** so index offsets always match record positions
//!
//! ## Architecture
//!
//! ```text
//! Document { text, metadata }
//!     │
//!     ├──> EmbeddingProvider
//!     │      └─> Vec<f32> (fixed dimension)
//!     │
//!     ├──> FlatIndex (row i <-> record i)
//!     │      └─> exact k-NN
//!     │
//!     └──> Snapshot
//!            └─> ids + documents + vectors (JSON)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ragdb_vector_store::{Document, DocumentStore, StubEmbedder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = Arc::new(StubEmbedder::new(384));
//!     let store = DocumentStore::open(384, "ragdb.json", embedder).await?;
//!
//!     let id = store
//!         .add(Document::new("Rust has no garbage collector").with_meta("source", "notes.md"))
//!         .await?;
//!
//!     for hit in store.search("memory management in rust", 5).await? {
//!         println!("{} {:.3} {}", hit.id, hit.relevance, hit.text);
//!     }
//!
//!     store.delete(&id).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod embeddings;
mod error;
mod flat_index;
mod snapshot;
mod store;
mod types;

pub use config::{CorruptSnapshotPolicy, RebuildStrategy, StoreConfig, DEFAULT_SNAPSHOT_FILE};
pub use embeddings::{
    EmbeddingConfig, EmbeddingMode, EmbeddingProvider, HttpEmbedder, StubEmbedder,
    DEFAULT_DIMENSION,
};
pub use error::{ErrorKind, Result, VectorStoreError};
pub use flat_index::{FlatIndex, Neighbor};
pub use snapshot::{Snapshot, StoreState, SNAPSHOT_SCHEMA_VERSION};
pub use store::DocumentStore;
pub use types::{Document, DocumentEntry, Metadata, MetadataValue, SearchHit, StoreStats};
