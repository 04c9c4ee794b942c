use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Vector store is not ready: initialize it before indexing")]
    NotReady,

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] codechat_vector_store::VectorStoreError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Indexing task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
