use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    EmbeddingFailed(String),

    #[error("Snapshot I/O error at {}: {message}", path.display())]
    PersistenceFailed { path: PathBuf, message: String },

    #[error("Corrupt snapshot at {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Context wrapper added by the store so callers can log and retry at a higher level.
    #[error("{operation}{} failed: {source}", describe_id(.id))]
    Operation {
        operation: &'static str,
        id: Option<String>,
        source: Box<VectorStoreError>,
    },
}

/// Flat classification of [`VectorStoreError`], looking through [`VectorStoreError::Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DimensionMismatch,
    EmbeddingFailed,
    PersistenceFailed,
    CorruptSnapshot,
    InvalidInput,
}

impl VectorStoreError {
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingFailed(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::PersistenceFailed {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn during(self, operation: &'static str, id: Option<&str>) -> Self {
        Self::Operation {
            operation,
            id: id.map(ToString::to_string),
            source: Box::new(self),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::EmbeddingFailed(_) => ErrorKind::EmbeddingFailed,
            Self::PersistenceFailed { .. } => ErrorKind::PersistenceFailed,
            Self::CorruptSnapshot { .. } => ErrorKind::CorruptSnapshot,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Operation { source, .. } => source.kind(),
        }
    }

    /// Id the failing operation was working on, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Operation { id, .. } => id.as_deref(),
            _ => None,
        }
    }
}

fn describe_id(id: &Option<String>) -> String {
    id.as_ref()
        .map(|id| format!(" ({id})"))
        .unwrap_or_default()
}
