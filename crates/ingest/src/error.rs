use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Chunker error: {0}")]
    Chunker(#[from] ragdb_chunker::ChunkerError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] ragdb_vector_store::VectorStoreError),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large for type {kind}: {size} bytes (limit {limit})")]
    TooLarge {
        kind: &'static str,
        size: u64,
        limit: u64,
    },
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
