use serde::{Deserialize, Serialize};

/// Statistics about an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of sources (files or texts) chunked successfully
    pub sources: usize,

    /// Number of chunks produced
    pub chunks: usize,

    /// Number of chunks stored
    pub documents_added: usize,

    /// Ids of the stored chunks, in insertion order
    pub ids: Vec<String>,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Errors encountered
    pub errors: Vec<String>,
}

impl IngestStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, chunks: usize) {
        self.sources += 1;
        self.chunks += chunks;
    }

    pub fn add_document(&mut self, id: String) {
        self.documents_added += 1;
        self.ids.push(id);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Fold the counters of another run into this one. Time is left to the caller.
    pub fn merge(&mut self, other: Self) {
        self.sources += other.sources;
        self.chunks += other.chunks;
        self.documents_added += other.documents_added;
        self.ids.extend(other.ids);
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
