use crate::error::{Result, VectorStoreError};
use crate::flat_index::{DistanceMetric, FlatIndex};
use crate::types::{Neighbor, StoreBatch, StoredRecord};
use async_trait::async_trait;
use codechat_code_chunker::ChunkKind;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::RwLock;

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Persistent vector store capability
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Fail with [`VectorStoreError::NotReady`] unless the store can serve requests
    async fn ensure_ready(&self) -> Result<()>;

    /// Upsert a batch keyed by id; existing ids are replaced.
    ///
    /// Visible to queries on this handle as soon as it returns; durable after
    /// [`VectorStore::flush`].
    async fn add(&self, batch: StoreBatch) -> Result<()>;

    /// Make every upsert accepted so far durable
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Up to `k` nearest neighbours ascending by distance, optionally restricted to
    /// one chunk kind
    async fn query(&self, vector: &[f32], k: usize, kind: Option<ChunkKind>)
        -> Result<Vec<Neighbor>>;

    /// Number of stored entries
    async fn count(&self) -> Result<usize>;

    /// Remove every entry
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct PersistedStore {
    schema_version: u32,
    dimension: usize,
    metric: DistanceMetric,
    records: BTreeMap<String, StoredRecord>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    schema_version: u32,
    dimension: usize,
    metric: DistanceMetric,
    records: &'a BTreeMap<String, StoredRecord>,
}

struct StoreState {
    records: BTreeMap<String, StoredRecord>,
    index: FlatIndex,
    /// Ids upserted since the last flush
    dirty: BTreeSet<String>,
}

/// Exclusive advisory lock on `<store>.lock`, released on drop
struct SnapshotLock {
    file: File,
}

impl SnapshotLock {
    async fn acquire(store_path: &Path) -> Result<Self> {
        let path = store_path.with_extension("lock");
        tokio::task::spawn_blocking(move || -> Result<Self> {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            let start = Instant::now();
            file.lock_exclusive()?;
            let waited = start.elapsed();
            if waited.as_millis() > 100 {
                log::debug!("Waited {}ms for {}", waited.as_millis(), path.display());
            }
            Ok(Self { file })
        })
        .await
        .map_err(|e| VectorStoreError::IoError(std::io::Error::other(e)))?
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Local vector store: exact search in memory, JSON snapshot on disk.
///
/// Constructed unready; [`LocalVectorStore::init`] loads the snapshot (or starts
/// empty). Upserts land in memory and are written on [`VectorStore::flush`]. A flush
/// holds an exclusive lock on `<store>.lock`, re-reads the snapshot and writes it
/// back with this handle's upserts merged in, so concurrent writers in other
/// processes keep each other's entries. Entries written elsewhere become visible here
/// after the next flush or `init()`.
pub struct LocalVectorStore {
    path: Option<PathBuf>,
    dimension: usize,
    metric: DistanceMetric,
    state: RwLock<Option<StoreState>>,
}

impl LocalVectorStore {
    /// Store persisted at `path`
    pub fn new(path: impl AsRef<Path>, dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            dimension,
            metric,
            state: RwLock::new(None),
        }
    }

    /// Store that never touches the filesystem
    pub fn in_memory(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            path: None,
            dimension,
            metric,
            state: RwLock::new(None),
        }
    }

    /// Build and initialize a persisted store in one step
    pub async fn open(
        path: impl AsRef<Path>,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<Self> {
        let store = Self::new(path, dimension, metric);
        store.init().await?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of upserts not yet flushed
    pub async fn pending(&self) -> usize {
        self.state
            .read()
            .await
            .as_ref()
            .map_or(0, |state| state.dirty.len())
    }

    /// Load the snapshot if one exists, otherwise start empty
    pub async fn init(&self) -> Result<()> {
        let records = match &self.path {
            Some(path) => self.load(path).await?,
            None => BTreeMap::new(),
        };
        let index = self.build_index(&records)?;

        log::info!(
            "Vector store ready ({} entries, dim={}, metric={})",
            records.len(),
            self.dimension,
            self.metric.as_str()
        );
        *self.state.write().await = Some(StoreState {
            records,
            index,
            dirty: BTreeSet::new(),
        });
        Ok(())
    }

    fn build_index(&self, records: &BTreeMap<String, StoredRecord>) -> Result<FlatIndex> {
        let mut index = FlatIndex::new(self.dimension, self.metric);
        for (id, record) in records {
            index.upsert(id, &record.vector)?;
        }
        Ok(index)
    }

    /// Records on disk; a missing snapshot is an empty store
    async fn load(&self, path: &Path) -> Result<BTreeMap<String, StoredRecord>> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(BTreeMap::new());
        }
        log::debug!("Loading vector store from {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        let persisted: PersistedStore = serde_json::from_slice(&bytes)?;

        if persisted.schema_version != STORE_SCHEMA_VERSION {
            return Err(VectorStoreError::SchemaVersion {
                found: persisted.schema_version,
                expected: STORE_SCHEMA_VERSION,
            });
        }
        if persisted.dimension != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: persisted.dimension,
            });
        }
        if persisted.metric != self.metric {
            log::warn!(
                "Store at {} was built with metric {}, querying with {}",
                path.display(),
                persisted.metric.as_str(),
                self.metric.as_str()
            );
        }
        Ok(persisted.records)
    }

    /// Write `records` to a temp file and rename it over the snapshot
    async fn write_snapshot(
        &self,
        path: &Path,
        records: &BTreeMap<String, StoredRecord>,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(&SnapshotRef {
            schema_version: STORE_SCHEMA_VERSION,
            dimension: self.dimension,
            metric: self.metric,
            records,
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::debug!("Persisted {} entries to {}", records.len(), path.display());
        Ok(())
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn ensure_ready(&self) -> Result<()> {
        if self.state.read().await.is_some() {
            Ok(())
        } else {
            Err(VectorStoreError::NotReady)
        }
    }

    async fn add(&self, batch: StoreBatch) -> Result<()> {
        batch.validate()?;
        if let Some(vector) = batch.vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(VectorStoreError::NotReady)?;

        // Dimensions are checked above, so the index upserts below cannot fail midway.
        let count = batch.len();
        let columns = batch
            .ids
            .into_iter()
            .zip(batch.vectors)
            .zip(batch.documents)
            .zip(batch.metadatas);
        for (((id, vector), document), metadata) in columns {
            state.index.upsert(&id, &vector)?;
            state.dirty.insert(id.clone());
            state.records.insert(
                id,
                StoredRecord {
                    vector,
                    document,
                    metadata,
                },
            );
        }

        log::debug!("Upserted {count} entries ({} total)", state.records.len());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(VectorStoreError::NotReady)?;
        let Some(path) = &self.path else {
            state.dirty.clear();
            return Ok(());
        };
        if state.dirty.is_empty() {
            return Ok(());
        }

        Self::ensure_parent(path).await?;
        let _lock = SnapshotLock::acquire(path).await?;

        let mut merged = self.load(path).await?;
        for id in &state.dirty {
            if let Some(record) = state.records.get(id) {
                merged.insert(id.clone(), record.clone());
            }
        }
        self.write_snapshot(path, &merged).await?;

        let written = state.dirty.len();
        // Pick up entries other writers committed since this handle loaded.
        if !merged.keys().eq(state.records.keys()) {
            state.index = self.build_index(&merged)?;
            state.records = merged;
        }
        state.dirty.clear();
        log::debug!("Flushed {written} entries to {}", path.display());
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        kind: Option<ChunkKind>,
    ) -> Result<Vec<Neighbor>> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(VectorStoreError::NotReady)?;

        let hits = state.index.search(vector, k, |id| match kind {
            None => true,
            Some(kind) => state
                .records
                .get(id)
                .is_some_and(|record| record.metadata.kind == kind),
        })?;

        Ok(hits
            .into_iter()
            .filter_map(|(id, distance)| {
                let record = state.records.get(&id)?;
                Some(Neighbor {
                    document: record.document.clone(),
                    metadata: record.metadata.clone(),
                    id,
                    distance,
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(VectorStoreError::NotReady)?;
        Ok(state.records.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(VectorStoreError::NotReady)?;
        if let Some(path) = &self.path {
            Self::ensure_parent(path).await?;
            let _lock = SnapshotLock::acquire(path).await?;
            self.write_snapshot(path, &BTreeMap::new()).await?;
        }
        let removed = state.records.len();
        state.records.clear();
        state.index.clear();
        state.dirty.clear();
        log::info!("Cleared vector store ({removed} entries removed)");
        Ok(())
    }
}

impl Drop for LocalVectorStore {
    fn drop(&mut self) {
        if let Some(state) = self.state.get_mut() {
            if !state.dirty.is_empty() && self.path.is_some() {
                log::warn!(
                    "Dropping vector store with {} unflushed entries",
                    state.dirty.len()
                );
            }
        }
    }
}
