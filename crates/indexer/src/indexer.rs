use crate::error::{IndexerError, Result};
use crate::identity::chunk_id;
use crate::limits::{clamp_index_concurrency, index_concurrency_from_env};
use crate::scanner::{canonical_or_self, FileScanner, ScannedFile};
use crate::stats::IndexStats;
use codechat_code_chunker::{Chunk, Chunker};
use codechat_vector_store::{
    ChunkMetadata, Embedder, StoreBatch, VectorStore, VectorStoreError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Chunks per store write
    pub batch_size: usize,
    /// Files processed at once by [`ChunkIndexer::index_files`]
    pub concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: index_concurrency_from_env(),
        }
    }
}

impl IndexerConfig {
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = clamp_index_concurrency(concurrency);
        self
    }
}

/// Extracts chunks, embeds them and upserts them into a vector store.
///
/// Store and embedder are explicit handles, so the same store can serve queries
/// while indexing runs. Every public indexing call flushes the store before it
/// returns. Files found on disk are named relative to the project root (the
/// working directory unless [`ChunkIndexer::with_project_root`] says otherwise),
/// which keeps chunk ids stable no matter which path reached a file.
#[derive(Clone)]
pub struct ChunkIndexer {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: IndexerConfig,
    project_root: Arc<Path>,
}

impl ChunkIndexer {
    pub fn new(chunker: Chunker, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self::with_config(chunker, embedder, store, IndexerConfig::default())
    }

    pub fn with_config(
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: IndexerConfig,
    ) -> Self {
        let config = IndexerConfig {
            batch_size: config.batch_size.max(1),
            concurrency: clamp_index_concurrency(config.concurrency),
        };
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            chunker,
            embedder,
            store,
            config,
            project_root: canonical_or_self(&cwd).into(),
        }
    }

    /// Anchor for the names of files reached through the filesystem
    #[must_use]
    pub fn with_project_root(mut self, root: impl AsRef<Path>) -> Self {
        self.project_root = canonical_or_self(root.as_ref()).into();
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> IndexerConfig {
        self.config
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    async fn ensure_ready(&self) -> Result<()> {
        self.store.ensure_ready().await.map_err(|e| match e {
            VectorStoreError::NotReady => IndexerError::NotReady,
            other => IndexerError::VectorStoreError(other),
        })
    }

    /// Index in-memory source bytes; `extension` selects the grammar
    pub async fn index_source(
        &self,
        source: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<IndexStats> {
        self.ensure_ready().await?;
        let start = Instant::now();

        let chunker = self.chunker.clone();
        let name = source.to_string();
        let ext = extension.to_string();
        let extraction =
            tokio::task::spawn_blocking(move || chunker.extract(&bytes, &name, &ext)).await?;

        let mut stats = IndexStats::new();
        stats.files = 1;
        for warning in &extraction.warnings {
            stats.add_warning(warning.to_string());
        }
        stats.merge(self.write_chunks(source, extraction.chunks).await);
        self.store.flush().await?;
        stats.time_ms = elapsed_ms(start);
        Ok(stats)
    }

    /// Index one file on disk, naming its chunks `source`
    pub async fn index_file(&self, path: impl AsRef<Path>, source: &str) -> Result<IndexStats> {
        self.ensure_ready().await?;
        let start = Instant::now();
        let mut stats = IndexStats::new();
        stats.files = 1;
        stats.merge(self.process_file(path.as_ref().to_path_buf(), source.to_string()).await);
        self.store.flush().await?;
        stats.time_ms = elapsed_ms(start);
        Ok(stats)
    }

    /// Index files and directories in one run.
    ///
    /// Directories are scanned like [`ChunkIndexer::index_directory`]; a file reached
    /// through several arguments is indexed once. A path that does not exist fails
    /// the whole call before anything is written.
    pub async fn index_paths(&self, paths: &[PathBuf]) -> Result<IndexStats> {
        self.ensure_ready().await?;
        let project_root = Arc::clone(&self.project_root);
        let paths = paths.to_vec();
        let files =
            tokio::task::spawn_blocking(move || collect_files(&project_root, &paths)).await??;
        self.index_files(files).await
    }

    /// Index many files concurrently, bounded by [`IndexerConfig::concurrency`].
    ///
    /// Per-file problems are recorded in the returned stats; only an unready store
    /// aborts the run.
    pub async fn index_files(&self, files: Vec<ScannedFile>) -> Result<IndexStats> {
        self.ensure_ready().await?;
        let start = Instant::now();
        log::info!(
            "Indexing {} files (concurrency {}, batch size {})",
            files.len(),
            self.config.concurrency,
            self.config.batch_size
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();
        for file in files {
            let indexer = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                indexer.process_file(file.path, file.source).await
            });
        }

        let mut stats = IndexStats::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(file_stats) => {
                    stats.files += 1;
                    stats.merge(file_stats);
                }
                Err(e) => {
                    log::error!("File indexing task failed: {e}");
                    stats.add_error(format!("Task failed: {e}"));
                }
            }
        }

        self.store.flush().await?;
        stats.time_ms = elapsed_ms(start);
        log::info!("Indexing completed: {stats}");
        Ok(stats)
    }

    /// Scan `root` for C/C++ sources and index them, naming chunks by their path
    /// relative to the project root
    pub async fn index_directory(&self, root: impl AsRef<Path>) -> Result<IndexStats> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(root.display().to_string()));
        }
        self.ensure_ready().await?;

        let scanner = FileScanner::new(root).source_root(&self.project_root);
        let files = tokio::task::spawn_blocking(move || scanner.scan()).await?;
        self.index_files(files).await
    }

    async fn process_file(&self, path: PathBuf, source: String) -> IndexStats {
        log::debug!("Processing file: {}", path.display());
        let chunker = self.chunker.clone();
        let name = source.clone();
        let extraction =
            match tokio::task::spawn_blocking(move || chunker.extract_file_as(&path, &name)).await
            {
                Ok(extraction) => extraction,
                Err(e) => {
                    let mut stats = IndexStats::new();
                    stats.add_error(format!("{source}: extraction task failed: {e}"));
                    return stats;
                }
            };

        let mut stats = IndexStats::new();
        for warning in &extraction.warnings {
            stats.add_warning(warning.to_string());
        }
        stats.merge(self.write_chunks(&source, extraction.chunks).await);
        stats
    }

    /// Embed and upsert one file's chunks.
    ///
    /// Each batch is written by a spawned task so embedding of the next batch overlaps
    /// the write. A failed write is logged and counted, never retried; an embedding
    /// failure stops the rest of this file.
    async fn write_chunks(&self, source: &str, chunks: Vec<Chunk>) -> IndexStats {
        let mut stats = IndexStats::new();
        stats.chunks = chunks.len();
        if chunks.is_empty() {
            return stats;
        }

        let mut writes = JoinSet::new();
        for group in chunks.chunks(self.config.batch_size) {
            let texts: Vec<&str> = group.iter().map(|chunk| chunk.content.as_str()).collect();
            let vectors = match self.embedder.embed_batch(&texts).await {
                Ok(vectors) => vectors,
                Err(e) => {
                    log::warn!("{source}: embedding failed, skipping remaining chunks: {e}");
                    stats.add_error(format!("{source}: embedding failed: {e}"));
                    break;
                }
            };

            let mut batch = StoreBatch::with_capacity(group.len());
            for (chunk, vector) in group.iter().zip(vectors) {
                batch.push(
                    chunk_id(&chunk.source, chunk.start_line, &chunk.content),
                    vector,
                    chunk.content.clone(),
                    ChunkMetadata::from_chunk(chunk),
                );
            }

            let store = Arc::clone(&self.store);
            writes.spawn(async move {
                let size = batch.len();
                (size, store.add(batch).await)
            });
        }

        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((size, Ok(()))) => {
                    log::debug!("{source}: wrote batch of {size} chunks");
                    stats.batches_written += 1;
                }
                Ok((size, Err(e))) => {
                    log::error!("{source}: failed to write batch of {size} chunks: {e}");
                    stats.batches_failed += 1;
                    stats.add_error(format!("{source}: batch write failed: {e}"));
                }
                Err(e) => {
                    log::error!("{source}: batch write task failed: {e}");
                    stats.batches_failed += 1;
                    stats.add_error(format!("{source}: batch write task failed: {e}"));
                }
            }
        }
        stats
    }
}

fn collect_files(project_root: &Path, paths: &[PathBuf]) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(FileScanner::new(path).source_root(project_root).scan());
        } else if path.is_file() {
            files.push(ScannedFile::named_against(project_root, path));
        } else {
            return Err(IndexerError::InvalidPath(path.display().to_string()));
        }
    }
    files.sort_by(|a, b| a.source.cmp(&b.source));
    files.dedup_by(|a, b| a.source == b.source);
    Ok(files)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis())
        .unwrap_or(u64::MAX)
        .max(1)
}
