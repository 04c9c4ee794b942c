//! # Codechat Indexer
//!
//! Turns C/C++ sources into stored, searchable chunk embeddings.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.gitignore aware)
//!     │      └─> C/C++ sources
//!     │
//!     ├──> Chunker (tree-sitter)
//!     │      └─> Chunks
//!     │
//!     ├──> Embed + upsert in batches
//!     │      └─> id = sha256(source|start_line|content)
//!     │
//!     └──> Flush store (locked merge into the snapshot)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codechat_code_chunker::{Chunker, ChunkerConfig};
//! use codechat_indexer::ChunkIndexer;
//! use codechat_vector_store::{DistanceMetric, LocalVectorStore, StubEmbedder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(LocalVectorStore::open(".codechat/store.json", 384, DistanceMetric::L2).await?);
//!     let indexer = ChunkIndexer::new(
//!         Chunker::new(ChunkerConfig::default())?,
//!         Arc::new(StubEmbedder::new(384)),
//!         store,
//!     )
//!     .with_project_root("/path/to/project");
//!     let stats = indexer.index_directory("/path/to/project/src").await?;
//!
//!     println!("Indexed {} files, {} chunks", stats.files, stats.chunks);
//!     Ok(())
//! }
//! ```

mod error;
mod identity;
mod indexer;
mod limits;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use identity::chunk_id;
pub use indexer::{ChunkIndexer, IndexerConfig, DEFAULT_BATCH_SIZE};
pub use limits::{
    clamp_index_concurrency, default_index_concurrency, index_concurrency_from_env,
    INDEX_CONCURRENCY_ENV, MAX_INDEX_CONCURRENCY,
};
pub use scanner::{source_name, FileScanner, ScannedFile};
pub use stats::IndexStats;
