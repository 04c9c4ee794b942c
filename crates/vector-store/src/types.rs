use crate::error::{Result, VectorStoreError};
use codechat_code_chunker::{Chunk, ChunkKind};
use serde::{Deserialize, Serialize};

/// Everything about a chunk except its content, stored next to the vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: ChunkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_name: Option<String>,
}

impl ChunkMetadata {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source.clone(),
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            kind: chunk.kind,
            function_name: chunk.function_name.clone(),
            class_name: chunk.class_name.clone(),
            struct_name: chunk.struct_name.clone(),
            array_name: chunk.array_name.clone(),
        }
    }

    /// Rebuild a chunk from its stored document
    pub fn into_chunk(self, content: String) -> Chunk {
        let mut chunk = Chunk::new(
            self.kind,
            self.source,
            self.start_line,
            self.end_line,
            content,
        );
        chunk.function_name = self.function_name;
        chunk.class_name = self.class_name;
        chunk.struct_name = self.struct_name;
        chunk.array_name = self.array_name;
        chunk
    }
}

/// Column-oriented batch for one upsert call
#[derive(Debug, Clone, Default)]
pub struct StoreBatch {
    pub ids: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
}

impl StoreBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            vectors: Vec::with_capacity(capacity),
            documents: Vec::with_capacity(capacity),
            metadatas: Vec::with_capacity(capacity),
        }
    }

    pub fn push(
        &mut self,
        id: impl Into<String>,
        vector: Vec<f32>,
        document: impl Into<String>,
        metadata: ChunkMetadata,
    ) {
        self.ids.push(id.into());
        self.vectors.push(vector);
        self.documents.push(document.into());
        self.metadatas.push(metadata);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check that every column has one entry per id
    pub fn validate(&self) -> Result<()> {
        let n = self.ids.len();
        if self.vectors.len() != n || self.documents.len() != n || self.metadatas.len() != n {
            return Err(VectorStoreError::InvalidBatch(format!(
                "column lengths differ: ids={n} vectors={} documents={} metadatas={}",
                self.vectors.len(),
                self.documents.len(),
                self.metadatas.len()
            )));
        }
        Ok(())
    }
}

/// A nearest-neighbour hit
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    /// Lower is more similar
    pub distance: f32,
    pub document: String,
    pub metadata: ChunkMetadata,
}

impl Neighbor {
    /// Convert into a retrieved chunk carrying its distance
    pub fn into_chunk(self) -> Chunk {
        self.metadata
            .into_chunk(self.document)
            .with_distance(self.distance)
    }
}

/// On-disk form of one entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: ChunkMetadata,
}
