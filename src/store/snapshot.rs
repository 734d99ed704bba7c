use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{cosine_similarity, NewEntry, SearchHit, StoreStats, VectorEntry, VectorStore};
use crate::error::{Error, Result};
use crate::ingest::{Metadata, SourceType};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    dimension: Option<usize>,
    /// Embedding model that produced the stored vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    entries: Vec<VectorEntry>,
}

/// Vector store kept entirely in memory and persisted as one JSON snapshot.
///
/// Every mutation rewrites the snapshot while holding the write lock, so
/// readers never see a partially applied batch and the file on disk always
/// matches a state readers could have observed. Each mutation and search is
/// O(n) in the number of stored entries.
pub struct SnapshotStore {
    path: PathBuf,
    declared_dimension: Option<usize>,
    declared_model: Option<String>,
    data: RwLock<Snapshot>,
}

impl SnapshotStore {
    /// Loads `path` if it exists. A snapshot that cannot be read or parsed is
    /// logged and replaced by an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match Self::load(&path) {
            Ok(Some(snapshot)) => {
                info!(
                    "Loaded {} vectors from {}",
                    snapshot.entries.len(),
                    path.display()
                );
                snapshot
            }
            Ok(None) => Snapshot::default(),
            Err(e) => {
                error!("Failed to load vector store {}: {}. Starting empty.", path.display(), e);
                Snapshot::default()
            }
        };

        Self {
            path,
            declared_dimension: None,
            declared_model: None,
            data: RwLock::new(data),
        }
    }

    /// Fixes the vector dimension up front. Fails if the loaded snapshot
    /// already holds vectors of another length.
    pub fn with_dimension(mut self, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::invalid_input("store dimension must be greater than zero"));
        }
        {
            let data = self.data.get_mut().map_err(|e| Error::Store(e.to_string()))?;
            match data.dimension {
                Some(existing) if existing != dimension && !data.entries.is_empty() => {
                    return Err(Error::DimensionMismatch {
                        expected: existing,
                        actual: dimension,
                    });
                }
                _ => data.dimension = Some(dimension),
            }
        }
        self.declared_dimension = Some(dimension);
        Ok(self)
    }

    /// Records which embedding model owns this store. Vectors from two models
    /// of the same length still live in different spaces, so a snapshot
    /// written by another model is rejected while it holds entries.
    pub fn with_model(mut self, model: &str) -> Result<Self> {
        {
            let data = self.data.get_mut().map_err(|e| Error::Store(e.to_string()))?;
            match data.model.as_deref() {
                Some(existing) if existing != model && !data.entries.is_empty() => {
                    return Err(Error::ModelMismatch {
                        expected: existing.to_string(),
                        actual: model.to_string(),
                    });
                }
                None if !data.entries.is_empty() => {
                    warn!(
                        "Snapshot {} does not record its embedding model; assuming '{}'",
                        self.path.display(),
                        model
                    );
                    data.model = Some(model.to_string());
                }
                _ => data.model = Some(model.to_string()),
            }
        }
        self.declared_model = Some(model.to_string());
        Ok(self)
    }

    pub fn model(&self) -> Option<String> {
        self.read().ok().and_then(|d| d.model.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimension(&self) -> Option<usize> {
        self.read().ok().and_then(|d| d.dimension)
    }

    fn load(path: &Path) -> Result<Option<Snapshot>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read(path)?;
        let mut snapshot: Snapshot = serde_json::from_slice(&content)?;
        if snapshot.dimension.is_none() {
            snapshot.dimension = snapshot.entries.first().map(|e| e.embedding.len());
        }
        if let Some(dim) = snapshot.dimension {
            if let Some(bad) = snapshot.entries.iter().find(|e| e.embedding.len() != dim) {
                return Err(Error::Store(format!(
                    "entry {} has {} dimensions, snapshot declares {}",
                    bad.id,
                    bad.embedding.len(),
                    dim
                )));
            }
        }
        Ok(Some(snapshot))
    }

    fn atomic_write(&self, data: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec(data)?;
        fs::write(&temp_path, json)?;
        fs::rename(temp_path, &self.path)?;
        debug!("Persisted {} vectors to {}", data.entries.len(), self.path.display());

        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>> {
        self.data.read().map_err(|e| Error::Store(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>> {
        self.data.write().map_err(|e| Error::Store(e.to_string()))
    }

    fn check_vector(dimension: Option<usize>, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::invalid_input("cannot store an empty vector"));
        }
        match dimension {
            Some(expected) if expected != vector.len() => Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    fn entry(new: NewEntry) -> VectorEntry {
        VectorEntry {
            id: Uuid::new_v4().to_string(),
            embedding: new.vector,
            text: new.text,
            metadata: new.metadata,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl VectorStore for SnapshotStore {
    async fn add(&self, text: String, vector: Vec<f32>, metadata: Metadata) -> Result<String> {
        let mut ids = self.add_batch(vec![NewEntry::new(text, vector, metadata)]).await?;
        ids.pop()
            .ok_or_else(|| Error::Store("no id assigned".into()))
    }

    async fn add_batch(&self, entries: Vec<NewEntry>) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut data = self.write()?;
        let dimension = data.dimension.or_else(|| entries.first().map(|e| e.vector.len()));
        for entry in &entries {
            Self::check_vector(dimension, &entry.vector)?;
        }

        let previous_len = data.entries.len();
        let previous_dimension = data.dimension;
        data.dimension = dimension;
        let ids: Vec<String> = entries
            .into_iter()
            .map(|new| {
                let entry = Self::entry(new);
                let id = entry.id.clone();
                data.entries.push(entry);
                id
            })
            .collect();

        if let Err(e) = self.atomic_write(&data) {
            data.entries.truncate(previous_len);
            data.dimension = previous_dimension;
            return Err(e);
        }
        info!("Stored {} vectors ({} total)", ids.len(), data.entries.len());
        Ok(ids)
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        source_type: Option<SourceType>,
    ) -> Result<Vec<SearchHit>> {
        let data = self.read()?;
        if data.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        Self::check_vector(data.dimension, query)?;

        let wanted = source_type.map(|s| s.as_str());
        let mut hits: Vec<SearchHit> = data
            .entries
            .iter()
            .filter(|entry| wanted.is_none() || entry.source_type() == wanted)
            .map(|entry| SearchHit {
                id: entry.id.clone(),
                similarity: cosine_similarity(query, &entry.embedding),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect();

        // Stable: equal scores keep insertion order.
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        Ok(hits)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut data = self.write()?;
        let Some(pos) = data.entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };

        let removed = data.entries.remove(pos);
        if let Err(e) = self.atomic_write(&data) {
            data.entries.insert(pos, removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorEntry>> {
        let data = self.read()?;
        Ok(data.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let data = self.read()?;

        let mut source_types = BTreeMap::new();
        for entry in &data.entries {
            let key = entry.source_type().unwrap_or("unknown").to_string();
            *source_types.entry(key).or_insert(0) += 1;
        }

        let size_bytes = if self.path.exists() {
            fs::metadata(&self.path)?.len()
        } else {
            0
        };

        Ok(StoreStats {
            total_vectors: data.entries.len(),
            source_types,
            storage_path: self.path.display().to_string(),
            dimension: data.dimension,
            size_bytes,
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.write()?;
        data.entries.clear();
        data.dimension = self.declared_dimension;
        data.model = self.declared_model.clone();

        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!("Cleared vector store {}", self.path.display());

        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read()?.entries.len())
    }
}
