//! # Codechat Search
//!
//! Retrieval for the chunk index: embed the question, ask the store for nearest
//! neighbours, then rank.
//!
//! ## Ranking
//!
//! 1. Keep hits with `distance < similarity_threshold`
//! 2. Sort ascending by distance
//! 3. Drop repeats of the same chunk (content, location, kind and names), keeping the
//!    closest
//!
//! ## Example
//!
//! ```no_run
//! use codechat_search::{RetrievalRequest, Retriever};
//! use codechat_vector_store::{DistanceMetric, LocalVectorStore, StubEmbedder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = LocalVectorStore::open(".codechat/store.json", 384, DistanceMetric::L2).await?;
//!     let retriever = Retriever::new(Arc::new(StubEmbedder::new(384)), Arc::new(store));
//!
//!     let request = RetrievalRequest::new("how are points added?", 5, 1.3);
//!     for chunk in retriever.retrieve(&request).await? {
//!         println!("{}:{} {}", chunk.source, chunk.start_line, chunk.display_name().unwrap_or("-"));
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod ranking;
mod retriever;

pub use error::{Result, SearchError};
pub use ranking::{rank_chunks, rank_neighbors};
pub use retriever::{RetrievalRequest, Retriever};
