use crate::error::{Result, SearchError};
use crate::ranking::rank_neighbors;
use codechat_code_chunker::{Chunk, ChunkKind};
use codechat_vector_store::{Embedder, VectorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One retrieval call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    /// Neighbours requested from the store; the result may be shorter
    pub top_k: usize,
    /// Maximum acceptable distance, exclusive
    pub similarity_threshold: f32,
    /// Exact-match filter applied inside the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChunkKind>,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>, top_k: usize, similarity_threshold: f32) -> Self {
        Self {
            query: query.into(),
            top_k,
            similarity_threshold,
            kind: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ChunkKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Embeds a question and returns the ranked chunks closest to it
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Chunks strictly under the threshold, nearest first, without duplicates.
    ///
    /// An uninitialized store is an error, never an empty result.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<Chunk>> {
        if request.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if request.similarity_threshold.is_nan() {
            return Err(SearchError::InvalidRequest(
                "similarity_threshold is NaN".to_string(),
            ));
        }
        self.store.ensure_ready().await?;

        if request.top_k == 0 {
            return Ok(Vec::new());
        }

        log::debug!(
            "Retrieving: query='{}', top_k={}, threshold={}, kind={:?}",
            request.query,
            request.top_k,
            request.similarity_threshold,
            request.kind
        );

        let vector = self.embedder.embed(&request.query).await?;
        let neighbors = self
            .store
            .query(&vector, request.top_k, request.kind)
            .await?;
        let candidates = neighbors.len();
        let ranked = rank_neighbors(neighbors, request.similarity_threshold);

        log::info!(
            "Retrieved {} chunks ({} candidates, threshold {})",
            ranked.len(),
            candidates,
            request.similarity_threshold
        );
        Ok(ranked)
    }
}
