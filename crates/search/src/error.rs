use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] codechat_vector_store::VectorStoreError),

    #[error("Empty query")]
    EmptyQuery,

    #[error("Invalid retrieval request: {0}")]
    InvalidRequest(String),
}

impl SearchError {
    /// True when the store has not been initialized yet
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            SearchError::VectorStoreError(codechat_vector_store::VectorStoreError::NotReady)
        )
    }
}
