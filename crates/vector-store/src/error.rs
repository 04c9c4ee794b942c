use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Vector store is not ready: call init() before use")]
    NotReady,

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Embedding request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unsupported store schema_version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}
