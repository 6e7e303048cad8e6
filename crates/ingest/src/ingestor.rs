use crate::error::{IngestError, Result};
use crate::source::{decode_text, SourceKind};
use crate::stats::IngestStats;
use ragdb_chunker::Chunker;
use ragdb_vector_store::{Document, DocumentStore, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Feeds files and raw text into a [`DocumentStore`], one document per chunk.
pub struct Ingestor {
    store: Arc<DocumentStore>,
    chunker: Chunker,
}

impl Ingestor {
    #[must_use]
    pub fn new(store: Arc<DocumentStore>, chunker: Chunker) -> Self {
        Self { store, chunker }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Chunk `text` and add every chunk tagged with `source`, `chunk_id`, `type` and
    /// `total_chunks`. A chunk that fails to store is recorded in the stats and skipped;
    /// one that was stored but not persisted is counted both as added and as an error.
    pub async fn ingest_text(&self, source: &str, kind: &str, text: &str) -> Result<IngestStats> {
        let started = Instant::now();
        let chunks = self.chunker.chunk_str(text)?;

        let mut stats = IngestStats::new();
        stats.add_source(chunks.len());

        for chunk in chunks {
            let chunk_id = chunk.chunk_id;
            let document = Document::new(chunk.text)
                .with_meta("source", source)
                .with_meta("chunk_id", chunk_id)
                .with_meta("type", kind)
                .with_meta("total_chunks", chunk.total_chunks);

            match self.store.add(document).await {
                Ok(id) => stats.add_document(id),
                Err(e) => {
                    log::warn!("Failed to store chunk {chunk_id} of {source}: {e}");
                    stats.add_error(format!("{source} chunk {chunk_id}: {e}"));
                    // A failed snapshot write leaves the chunk stored in memory.
                    if e.kind() == ErrorKind::PersistenceFailed {
                        if let Some(id) = e.id() {
                            stats.add_document(id.to_string());
                        }
                    }
                }
            }
        }

        stats.time_ms = elapsed_ms(started);
        log::info!(
            "Ingested {source}: {}/{} chunks stored in {}ms",
            stats.documents_added,
            stats.chunks,
            stats.time_ms
        );
        Ok(stats)
    }

    /// Ingest one file. The source label is the file name.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestStats> {
        let kind = SourceKind::from_path(path)?;
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| IngestError::io(path, e))?;
        kind.check_size(meta.len())?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IngestError::io(path, e))?;
        let text = kind.extract_text(&decode_text(bytes));

        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        log::debug!("Processing {} as {}", path.display(), kind.as_str());
        self.ingest_text(&source, kind.as_str(), &text).await
    }

    /// Ingest several files. Per-file failures are collected in the returned stats.
    pub async fn ingest_paths(&self, paths: &[PathBuf]) -> IngestStats {
        let started = Instant::now();
        let mut aggregated = IngestStats::new();

        for path in paths {
            match self.ingest_file(path).await {
                Ok(stats) => aggregated.merge(stats),
                Err(e) => {
                    log::warn!("Skipping {}: {e}", path.display());
                    aggregated.add_error(format!("{}: {e}", path.display()));
                }
            }
        }

        aggregated.time_ms = elapsed_ms(started);
        aggregated
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
