//! # Codechat Vector Store
//!
//! Embeddings and nearest-neighbour storage for extracted C/C++ chunks.
//!
//! ## Features
//!
//! - **Pluggable embedders** behind the [`Embedder`] trait (deterministic stub, Ollama)
//! - **Exact search** over a flat in-memory index (L2 or cosine)
//! - **Persistent storage** as an atomically rewritten JSON snapshot
//! - **Idempotent upserts** keyed by chunk identity
//!
//! ## Architecture
//!
//! ```text
//! Chunk[]
//!     │
//!     ├──> Embedder (stub | ollama)
//!     │      └─> Vector[dim]
//!     │
//!     ├──> FlatIndex
//!     │      └─> exact k-NN, optional kind filter
//!     │
//!     └──> JSON snapshot
//!            └─> schema_version + records
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codechat_vector_store::{DistanceMetric, Embedder, LocalVectorStore, StubEmbedder, VectorStore};
//!
//! #[tokio::main]
//! async fn main() -> codechat_vector_store::Result<()> {
//!     let embedder = StubEmbedder::new(384);
//!     let store = LocalVectorStore::open(".codechat/store.json", 384, DistanceMetric::L2).await?;
//!
//!     let query = embedder.embed("parse a config file").await?;
//!     for hit in store.query(&query, 5, None).await? {
//!         println!("{}:{} ({:.3})", hit.metadata.source, hit.metadata.start_line, hit.distance);
//!     }
//!     Ok(())
//! }
//! ```

mod embeddings;
mod error;
mod flat_index;
mod store;
mod types;

pub use embeddings::{
    embedder_from_config, known_model_dimension, Embedder, EmbeddingConfig, EmbeddingMode,
    OllamaEmbedder, StubEmbedder, EMBEDDING_MODE_ENV,
};
pub use error::{Result, VectorStoreError};
pub use flat_index::{DistanceMetric, FlatIndex};
pub use store::{LocalVectorStore, VectorStore, STORE_SCHEMA_VERSION};
pub use types::{ChunkMetadata, Neighbor, StoreBatch};
