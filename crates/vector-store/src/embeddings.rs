use crate::error::{Result, VectorStoreError};
use crate::flat_index::DistanceMetric;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const EMBEDDING_MODE_ENV: &str = "CODECHAT_EMBEDDING_MODE";

/// Text embedding capability consumed by the indexer and the retriever
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VectorStoreError::EmbeddingError("No embedding returned".to_string()))
    }

    /// Embed several texts; the result has one vector per input, in order
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Which embedder backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Deterministic hash vectors; no model, no network. Only exact text matches
    /// land close together, so it suits tests and offline smoke runs.
    Stub,
    /// Ollama embedding endpoint
    #[default]
    Ollama,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stub" => Some(Self::Stub),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Ollama => "ollama",
        }
    }
}

/// Embedder settings, typically loaded from the `[embedding]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub model: String,
    pub base_url: String,
    /// Vector length; `None` picks the known size for `model`
    pub dimension: Option<usize>,
    pub timeout_secs: u64,
    /// How stored vectors are compared with the query vector
    pub metric: DistanceMetric,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::default(),
            model: "all-minilm".to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimension: None,
            timeout_secs: 30,
            metric: DistanceMetric::L2,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_dimension(&self) -> usize {
        self.dimension
            .unwrap_or_else(|| known_model_dimension(&self.model))
    }
}

/// Vector length of common Ollama embedding models
pub fn known_model_dimension(model: &str) -> usize {
    let name = model.split(':').next().unwrap_or(model);
    match name {
        "all-minilm" => 384,
        "nomic-embed-text" => 768,
        "mxbai-embed-large" => 1024,
        "snowflake-arctic-embed" => 1024,
        "bge-m3" => 1024,
        _ => 768,
    }
}

/// Build the embedder described by `config`
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let dimension = config.resolved_dimension();
    log::info!(
        "Using {} embeddings ({}, dim={dimension})",
        config.mode.as_str(),
        config.model
    );
    match config.mode {
        EmbeddingMode::Stub => {
            log::warn!(
                "Stub embeddings carry no meaning: only near-verbatim code will match. \
                 Set {EMBEDDING_MODE_ENV}=ollama for semantic search"
            );
            Ok(Arc::new(StubEmbedder::new(dimension)))
        }
        EmbeddingMode::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            &config.base_url,
            &config.model,
            dimension,
            Duration::from_secs(config.timeout_secs),
        )?)),
    }
}

/// Deterministic, normalized pseudo-random embedding derived from the text hash.
///
/// Identical texts map to identical vectors; unrelated texts land far apart. Useful
/// for tests and offline runs where semantic quality does not matter.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "stub"
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Embeddings from an Ollama server (`POST /api/embed`)
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, dimension: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimension,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::EmbeddingError(format!(
                "Ollama API error {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response.json().await?;
        if parsed.embeddings.len() != texts.len() {
            return Err(VectorStoreError::EmbeddingError(format!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }
        for vector in &parsed.embeddings {
            if vector.len() != self.dimension {
                return Err(VectorStoreError::InvalidDimension {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        log::debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(parsed.embeddings)
    }
}
