use crate::error::{Result, VectorStoreError};
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Full store contents in offset order. The three sequences always have equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub ids: Vec<String>,
    pub documents: Vec<Document>,
    pub vectors: Vec<Vec<f32>>,
}

impl StoreState {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Serialize)]
struct PersistedSnapshotRef<'a> {
    schema_version: u32,
    dimension: usize,
    ids: &'a [String],
    documents: &'a [Document],
    vectors: &'a [Vec<f32>],
}

#[derive(Deserialize)]
struct PersistedSnapshot {
    schema_version: u32,
    dimension: usize,
    ids: Vec<String>,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
}

/// A single-file JSON snapshot of a store.
///
/// Writes are serialized; each one goes through its own temp file.
#[derive(Debug)]
pub struct Snapshot {
    path: PathBuf,
    dimension: usize,
    write_guard: Mutex<()>,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            path: path.into(),
            dimension,
            write_guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `state` atomically: temp file in the same directory, fsync, rename over the target.
    pub async fn save(&self, state: &StoreState) -> Result<()> {
        if state.documents.len() != state.ids.len() || state.vectors.len() != state.ids.len() {
            return Err(VectorStoreError::invalid_input(format!(
                "refusing to write misaligned snapshot ({} ids, {} documents, {} vectors)",
                state.ids.len(),
                state.documents.len(),
                state.vectors.len()
            )));
        }

        let persisted = PersistedSnapshotRef {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            dimension: self.dimension,
            ids: &state.ids,
            documents: &state.documents,
            vectors: &state.vectors,
        };
        let bytes = serde_json::to_vec(&persisted)
            .map_err(|e| VectorStoreError::persistence(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VectorStoreError::persistence(parent, e))?;
        }

        let _guard = self.write_guard.lock().await;
        let tmp = tmp_path(&self.path);
        if let Err(err) = write_synced(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(VectorStoreError::persistence(&tmp, err));
        }
        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(VectorStoreError::persistence(&self.path, err));
        }

        log::debug!(
            "Snapshot saved to {} ({} records)",
            self.path.display(),
            state.len()
        );
        Ok(())
    }

    /// Read the snapshot. A missing file is an empty store; anything unreadable or structurally
    /// invalid is [`VectorStoreError::CorruptSnapshot`].
    pub async fn load(&self) -> Result<StoreState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No snapshot at {}, starting empty",
                    self.path.display()
                );
                return Ok(StoreState::default());
            }
            Err(err) => {
                return Err(VectorStoreError::corrupt(
                    &self.path,
                    format!("unreadable: {err}"),
                ));
            }
        };

        let persisted: PersistedSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| VectorStoreError::corrupt(&self.path, format!("invalid JSON: {e}")))?;
        self.validate(persisted)
    }

    fn validate(&self, persisted: PersistedSnapshot) -> Result<StoreState> {
        let corrupt = |reason: String| VectorStoreError::corrupt(&self.path, reason);

        if persisted.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(corrupt(format!(
                "unsupported schema_version {} (expected {SNAPSHOT_SCHEMA_VERSION})",
                persisted.schema_version
            )));
        }
        if persisted.dimension != self.dimension {
            return Err(corrupt(format!(
                "snapshot dimension {} does not match configured dimension {}",
                persisted.dimension, self.dimension
            )));
        }
        let n = persisted.ids.len();
        if persisted.documents.len() != n || persisted.vectors.len() != n {
            return Err(corrupt(format!(
                "misaligned sequences ({n} ids, {} documents, {} vectors)",
                persisted.documents.len(),
                persisted.vectors.len()
            )));
        }
        if let Some((row, v)) = persisted
            .vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != self.dimension)
        {
            return Err(corrupt(format!(
                "vector {row} has {} components (expected {})",
                v.len(),
                self.dimension
            )));
        }
        let duplicate = {
            let mut seen = HashSet::with_capacity(n);
            persisted
                .ids
                .iter()
                .find(|id| !seen.insert(id.as_str()))
                .cloned()
        };
        if let Some(dup) = duplicate {
            return Err(corrupt(format!("duplicate id {dup}")));
        }

        Ok(StoreState {
            ids: persisted.ids,
            documents: persisted.documents,
            vectors: persisted.vectors,
        })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("snapshot"), ToOwned::to_owned);
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(name)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_state() -> StoreState {
        StoreState {
            ids: vec!["a".to_string(), "b".to_string()],
            documents: vec![
                Document::new("alpha").with_meta("source", "a.txt"),
                Document::new("beta")
                    .with_meta("chunk_id", 2_i64)
                    .with_meta("ratio", 0.1),
            ],
            vectors: vec![vec![0.1, 0.2, 0.3], vec![-1.5, 1e-7, 3.25]],
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path().join("nope.json"), 3);
        assert!(snapshot.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn roundtrip_is_exact() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path().join("nested/dir/store.json"), 3);
        let state = sample_state();

        snapshot.save(&state).await.unwrap();
        let loaded = snapshot.load().await.unwrap();
        assert_eq!(loaded, state);
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("nested/dir"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![OsString::from("store.json")]);
    }

    #[test]
    fn temp_names_are_unique_siblings() {
        let target = Path::new("/data/store.json");
        let a = tmp_path(target);
        let b = tmp_path(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        assert!(a.to_string_lossy().ends_with(".tmp"));
    }

    #[tokio::test]
    async fn concurrent_saves_all_succeed() {
        let tmp = TempDir::new().unwrap();
        let snapshot = std::sync::Arc::new(Snapshot::new(tmp.path().join("store.json"), 3));
        let state = std::sync::Arc::new(sample_state());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let snapshot = snapshot.clone();
            let state = state.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..10 {
                    snapshot.save(&state).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(snapshot.load().await.unwrap(), *state);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path().join("store.json"), 3);
        snapshot.save(&sample_state()).await.unwrap();
        snapshot.save(&StoreState::default()).await.unwrap();
        assert!(snapshot.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = Snapshot::new(&path, 3).load().await.unwrap_err();
        assert!(matches!(err, VectorStoreError::CorruptSnapshot { .. }));
    }

    async fn load_json(value: serde_json::Value, dimension: usize) -> Result<StoreState> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        tokio::fs::write(&path, serde_json::to_vec(&value).unwrap())
            .await
            .unwrap();
        Snapshot::new(&path, dimension).load().await
    }

    #[tokio::test]
    async fn structural_violations_are_corrupt() {
        let misaligned = serde_json::json!({
            "schema_version": 1, "dimension": 2,
            "ids": ["a", "b"], "documents": [{"text": "x", "metadata": {}}], "vectors": [[0.0, 0.0]]
        });
        let wrong_width = serde_json::json!({
            "schema_version": 1, "dimension": 2,
            "ids": ["a"], "documents": [{"text": "x"}], "vectors": [[0.0]]
        });
        let duplicate = serde_json::json!({
            "schema_version": 1, "dimension": 1,
            "ids": ["a", "a"], "documents": [{"text": "x"}, {"text": "y"}], "vectors": [[0.0], [1.0]]
        });
        let future = serde_json::json!({
            "schema_version": 99, "dimension": 1, "ids": [], "documents": [], "vectors": []
        });

        for (value, dim) in [(misaligned, 2), (wrong_width, 2), (duplicate, 1), (future, 1)] {
            let err = load_json(value, dim).await.unwrap_err();
            assert!(
                matches!(err, VectorStoreError::CorruptSnapshot { .. }),
                "unexpected error: {err}"
            );
        }
    }

    #[tokio::test]
    async fn dimension_change_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        Snapshot::new(&path, 3).save(&sample_state()).await.unwrap();

        let err = Snapshot::new(&path, 4).load().await.unwrap_err();
        assert!(err.to_string().contains("does not match configured dimension"));
    }

    #[tokio::test]
    async fn misaligned_state_is_not_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        let mut state = sample_state();
        state.vectors.pop();

        assert!(Snapshot::new(&path, 3).save(&state).await.is_err());
        assert!(!path.exists());
    }
}
