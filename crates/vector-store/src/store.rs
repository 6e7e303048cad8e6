use crate::config::{CorruptSnapshotPolicy, RebuildStrategy, StoreConfig};
use crate::embeddings::EmbeddingProvider;
use crate::error::{ErrorKind, Result, VectorStoreError};
use crate::flat_index::FlatIndex;
use crate::snapshot::{Snapshot, StoreState};
use crate::types::{
    Document, DocumentEntry, Metadata, MetadataValue, SearchHit, StoreStats, StoredRecord,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Embedded document store: records in offset order, aligned row-for-row with a [`FlatIndex`].
///
/// All state sits behind one lock. Mutations hold it exclusively for their whole duration,
/// embedding calls and the snapshot write included; reads share it.
pub struct DocumentStore {
    state: RwLock<StoreInner>,
    embedder: Arc<dyn EmbeddingProvider>,
    snapshot: Snapshot,
    config: StoreConfig,
}

struct StoreInner {
    records: Vec<StoredRecord>,
    index: FlatIndex,
}

/// A pending non-append mutation, expressed as offsets into the current record order.
#[derive(Clone, Copy)]
enum Change<'a> {
    Remove(usize),
    Replace(usize, &'a str),
}

impl StoreInner {
    fn empty(dimension: usize) -> Self {
        Self {
            records: Vec::new(),
            index: FlatIndex::new(dimension),
        }
    }

    fn from_state(state: StoreState, dimension: usize) -> Result<Self> {
        let mut index = FlatIndex::new(dimension);
        index.rebuild(&state.vectors)?;
        let records = state
            .ids
            .into_iter()
            .zip(state.documents)
            .map(|(id, document)| StoredRecord { id, document })
            .collect();
        let inner = Self { records, index };
        debug_assert!(inner.is_aligned());
        Ok(inner)
    }

    fn to_state(&self) -> StoreState {
        StoreState {
            ids: self.records.iter().map(|r| r.id.clone()).collect(),
            documents: self.records.iter().map(|r| r.document.clone()).collect(),
            vectors: self.index.rows(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn is_aligned(&self) -> bool {
        self.records.len() == self.index.len()
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.position(&id).is_none() {
                return id;
            }
        }
    }
}

impl DocumentStore {
    /// Open (or create) the store persisted at `snapshot_path`, with default settings.
    pub async fn open(
        dimension: usize,
        snapshot_path: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(dimension, snapshot_path), embedder).await
    }

    pub async fn open_with_config(
        config: StoreConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        config.validate()?;
        if embedder.dimension() != config.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: config.dimension,
                actual: embedder.dimension(),
            });
        }

        let snapshot = Snapshot::new(&config.snapshot_path, config.dimension);
        let inner = load_inner(&snapshot, config.on_corrupt, config.dimension).await?;
        log::info!(
            "Opened document store at {} ({} documents, dimension {}, embedder {})",
            snapshot.path().display(),
            inner.records.len(),
            config.dimension,
            embedder.name()
        );

        Ok(Self {
            state: RwLock::new(inner),
            embedder,
            snapshot,
            config,
        })
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        self.snapshot.path()
    }

    /// Insert a document under a freshly generated id.
    ///
    /// Embedding and validation failures leave the store untouched. A failed snapshot write is
    /// reported as `PersistenceFailed` carrying the new id; the document stays in memory.
    pub async fn add(&self, document: Document) -> Result<String> {
        validate_text(&document.text)
            .and_then(|()| validate_metadata(&document.metadata))
            .map_err(|e| e.during("add", None))?;

        let mut inner = self.state.write().await;
        let vector = self
            .embed_one(&document.text)
            .await
            .map_err(|e| e.during("add", None))?;

        let id = inner.fresh_id();
        inner.records.push(StoredRecord {
            id: id.clone(),
            document,
        });
        if let Err(err) = inner.index.append(&vector) {
            inner.records.pop();
            return Err(err.during("add", None));
        }
        debug_assert!(inner.is_aligned());
        log::debug!("Added {id} ({} documents)", inner.records.len());

        self.persist(&inner)
            .await
            .map_err(|e| e.during("add", Some(&id)))?;
        Ok(id)
    }

    /// Remove the document with `id` and rebuild the index. Returns `false` if `id` is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.state.write().await;
        let Some(offset) = inner.position(id) else {
            log::debug!("Delete of unknown id {id}");
            return Ok(false);
        };

        let vectors = self
            .rebuild_vectors(&inner, Change::Remove(offset))
            .await
            .map_err(|e| e.during("delete", Some(id)))?;
        inner
            .index
            .rebuild(&vectors)
            .map_err(|e| e.during("delete", Some(id)))?;
        inner.records.remove(offset);
        debug_assert!(inner.is_aligned());
        log::info!(
            "Deleted {id}; rebuilt index with {} rows ({})",
            inner.index.len(),
            self.config.rebuild.as_str()
        );

        self.persist(&inner)
            .await
            .map_err(|e| e.during("delete", Some(id)))?;
        Ok(true)
    }

    /// Replace the text of `id`, merge `metadata_patch` into its metadata (patch keys win) and
    /// rebuild the index. The id is preserved. Returns `false` if `id` is unknown.
    pub async fn update(
        &self,
        id: &str,
        new_text: impl Into<String>,
        metadata_patch: Option<Metadata>,
    ) -> Result<bool> {
        let new_text = new_text.into();
        validate_text(&new_text)
            .and_then(|()| metadata_patch.as_ref().map_or(Ok(()), validate_metadata))
            .map_err(|e| e.during("update", Some(id)))?;

        let mut inner = self.state.write().await;
        let Some(offset) = inner.position(id) else {
            log::debug!("Update of unknown id {id}");
            return Ok(false);
        };

        let vectors = self
            .rebuild_vectors(&inner, Change::Replace(offset, &new_text))
            .await
            .map_err(|e| e.during("update", Some(id)))?;
        inner
            .index
            .rebuild(&vectors)
            .map_err(|e| e.during("update", Some(id)))?;
        let document = &mut inner.records[offset].document;
        document.text = new_text;
        if let Some(patch) = metadata_patch {
            document.merge_metadata(patch);
        }
        debug_assert!(inner.is_aligned());
        log::info!("Updated {id}; rebuilt index with {} rows", inner.index.len());

        self.persist(&inner)
            .await
            .map_err(|e| e.during("update", Some(id)))?;
        Ok(true)
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        let inner = self.state.read().await;
        inner
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.document.clone())
    }

    /// A page of records in offset order. Out-of-range `skip`/`limit` are clamped.
    pub async fn list(&self, skip: usize, limit: usize) -> Vec<DocumentEntry> {
        let inner = self.state.read().await;
        inner
            .records
            .iter()
            .skip(skip)
            .take(limit)
            .map(|r| DocumentEntry {
                id: r.id.clone(),
                document: r.document.clone(),
            })
            .collect()
    }

    /// The `k` documents nearest to `query`, closest first.
    ///
    /// `k == 0` or an empty store yields no hits without calling the embedder. Any other query,
    /// blank ones included, is embedded and ranked.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let inner = self.state.read().await;
        if k == 0 || inner.records.is_empty() {
            return Ok(Vec::new());
        }

        let vector = self
            .embed_one(query)
            .await
            .map_err(|e| e.during("search", None))?;
        let neighbors = inner
            .index
            .search(&vector, k)
            .map_err(|e| e.during("search", None))?;

        let hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter_map(|n| {
                let Some(record) = inner.records.get(n.offset) else {
                    log::warn!("Index offset {} has no record, skipping", n.offset);
                    return None;
                };
                Some(SearchHit {
                    id: record.id.clone(),
                    text: record.document.text.clone(),
                    metadata: record.document.metadata.clone(),
                    distance: n.distance,
                    relevance: 1.0 / (1.0 + n.distance),
                })
            })
            .collect();
        log::debug!("Search returned {} hits (k={k})", hits.len());
        Ok(hits)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let inner = self.state.read().await;
        StoreStats {
            documents: inner.records.len(),
            index_rows: inner.index.len(),
            dimension: inner.index.dimension(),
        }
    }

    /// Write the current state to the snapshot file. Concurrent calls are serialized.
    pub async fn save(&self) -> Result<()> {
        let inner = self.state.read().await;
        self.persist(&inner).await.map_err(|e| e.during("save", None))
    }

    /// Replace the in-memory state with the snapshot on disk.
    ///
    /// A corrupt snapshot is always an error here, whatever the open-time policy says; on any
    /// error the current state is kept.
    pub async fn reload(&self) -> Result<usize> {
        let mut inner = self.state.write().await;
        let policy = CorruptSnapshotPolicy::Fail;
        let loaded = load_inner(&self.snapshot, policy, self.config.dimension)
            .await
            .map_err(|e| e.during("reload", None))?;
        *inner = loaded;
        log::info!("Reloaded {} documents from snapshot", inner.records.len());
        Ok(inner.records.len())
    }

    async fn persist(&self, inner: &StoreInner) -> Result<()> {
        self.snapshot.save(&inner.to_state()).await
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_checked(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorStoreError::embedding("Empty embedding result"))
    }

    /// Embed `texts` and verify count and width of the result.
    async fn embed_checked(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(VectorStoreError::embedding(format!(
                "{} returned {} vectors for {} texts",
                self.embedder.name(),
                vectors.len(),
                texts.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimension) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.config.dimension,
                actual: bad.len(),
            });
        }
        if vectors.iter().flatten().any(|v| !v.is_finite()) {
            return Err(VectorStoreError::embedding(format!(
                "{} returned a vector with non-finite components",
                self.embedder.name()
            )));
        }
        Ok(vectors)
    }

    /// Vectors for the record order that results from `change`, in that order.
    /// Nothing is modified; the caller commits only once this succeeds.
    async fn rebuild_vectors(&self, inner: &StoreInner, change: Change<'_>) -> Result<Vec<Vec<f32>>> {
        match self.config.rebuild {
            RebuildStrategy::ReembedAll => {
                let texts: Vec<&str> = inner
                    .records
                    .iter()
                    .enumerate()
                    .filter_map(|(offset, record)| match change {
                        Change::Remove(at) if at == offset => None,
                        Change::Replace(at, text) if at == offset => Some(text),
                        _ => Some(record.document.text.as_str()),
                    })
                    .collect();
                self.embed_checked(&texts).await
            }
            RebuildStrategy::ReuseVectors => {
                let mut rows = inner.index.rows();
                match change {
                    Change::Remove(at) => {
                        rows.remove(at);
                    }
                    Change::Replace(at, text) => {
                        let vector = self.embed_one(text).await?;
                        if let Some(row) = rows.get_mut(at) {
                            *row = vector;
                        }
                    }
                }
                Ok(rows)
            }
        }
    }
}

async fn load_inner(
    snapshot: &Snapshot,
    policy: CorruptSnapshotPolicy,
    dimension: usize,
) -> Result<StoreInner> {
    match snapshot.load().await {
        Ok(state) => StoreInner::from_state(state, dimension),
        Err(err)
            if err.kind() == ErrorKind::CorruptSnapshot
                && policy == CorruptSnapshotPolicy::StartEmpty =>
        {
            log::warn!("{err}; starting with an empty store");
            Ok(StoreInner::empty(dimension))
        }
        Err(err) => Err(err),
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(VectorStoreError::invalid_input("document text is empty"));
    }
    Ok(())
}

/// JSON has no NaN or infinity, so such floats could not be written to the snapshot.
fn validate_metadata(metadata: &Metadata) -> Result<()> {
    for (key, value) in metadata {
        if let MetadataValue::Float(f) = value {
            if !f.is_finite() {
                return Err(VectorStoreError::invalid_input(format!(
                    "metadata '{key}' is not a finite number"
                )));
            }
        }
    }
    Ok(())
}
