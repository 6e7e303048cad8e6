use crate::embeddings::{parse_dimension, DEFAULT_DIMENSION};
use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SNAPSHOT_FILE: &str = "ragdb.json";

/// Configuration for a [`crate::DocumentStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file location
    pub snapshot_path: PathBuf,

    /// Embedding width, fixed for the lifetime of the store
    pub dimension: usize,

    /// What to do when the snapshot exists but cannot be loaded
    pub on_corrupt: CorruptSnapshotPolicy,

    /// Where rebuild vectors come from after delete/update
    pub rebuild: RebuildStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            dimension: DEFAULT_DIMENSION,
            on_corrupt: CorruptSnapshotPolicy::Fail,
            rebuild: RebuildStrategy::ReembedAll,
        }
    }
}

impl StoreConfig {
    pub fn new(dimension: usize, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            dimension,
            ..Self::default()
        }
    }

    /// Defaults overridden by `RAGDB_STORE_PATH`, `RAGDB_EMBEDDING_DIM`, `RAGDB_ON_CORRUPT`
    /// and `RAGDB_REBUILD`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = env::var("RAGDB_STORE_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Ok(raw) = env::var("RAGDB_EMBEDDING_DIM") {
            config.dimension = parse_dimension(&raw)?;
        }
        if let Ok(raw) = env::var("RAGDB_ON_CORRUPT") {
            config.on_corrupt = CorruptSnapshotPolicy::parse(&raw)?;
        }
        if let Ok(raw) = env::var("RAGDB_REBUILD") {
            config.rebuild = RebuildStrategy::parse(&raw)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_on_corrupt(mut self, policy: CorruptSnapshotPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    #[must_use]
    pub fn with_rebuild(mut self, strategy: RebuildStrategy) -> Self {
        self.rebuild = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(VectorStoreError::invalid_input("dimension must be > 0"));
        }
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(VectorStoreError::invalid_input(
                "snapshot_path must not be empty",
            ));
        }
        Ok(())
    }
}

/// Startup behavior for a snapshot that exists but fails to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptSnapshotPolicy {
    /// Refuse to open the store
    Fail,
    /// Log the error and start with zero records; the bad file is overwritten on the next write
    StartEmpty,
}

impl CorruptSnapshotPolicy {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "empty" | "start_empty" => Ok(Self::StartEmpty),
            other => Err(VectorStoreError::invalid_input(format!(
                "Unsupported RAGDB_ON_CORRUPT '{other}' (expected 'fail' or 'empty')"
            ))),
        }
    }
}

/// Source of the vectors used to rebuild the index after delete/update.
///
/// Both strategies rebuild the whole index; they differ only in embedding calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildStrategy {
    /// Re-embed every surviving document (O(N) embedding calls per mutation)
    ReembedAll,
    /// Reuse the vectors already in the index; embed only the changed document
    ReuseVectors,
}

impl RebuildStrategy {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reembed" | "reembed_all" => Ok(Self::ReembedAll),
            "reuse" | "reuse_vectors" => Ok(Self::ReuseVectors),
            other => Err(VectorStoreError::invalid_input(format!(
                "Unsupported RAGDB_REBUILD '{other}' (expected 'reembed' or 'reuse')"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReembedAll => "reembed",
            Self::ReuseVectors => "reuse",
        }
    }
}
