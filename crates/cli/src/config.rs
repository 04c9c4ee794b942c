use anyhow::{Context, Result};
use codechat_code_chunker::ChunkerConfig;
use codechat_indexer::{
    clamp_index_concurrency, default_index_concurrency, DEFAULT_BATCH_SIZE,
    INDEX_CONCURRENCY_ENV,
};
use codechat_vector_store::{EmbeddingConfig, EmbeddingMode, EMBEDDING_MODE_ENV};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "codechat.toml";

pub(crate) const STORE_PATH_ENV: &str = "CODECHAT_STORE_PATH";
pub(crate) const PROJECT_ROOT_ENV: &str = "CODECHAT_PROJECT_ROOT";
pub(crate) const EMBEDDING_MODEL_ENV: &str = "CODECHAT_EMBEDDING_MODEL";
pub(crate) const OLLAMA_URL_ENV: &str = "CODECHAT_OLLAMA_URL";

/// Contents of `codechat.toml`; every section is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub store_path: PathBuf,
    /// Indexed files are named relative to this directory; unset means the working
    /// directory
    pub project_root: Option<PathBuf>,
    pub embedding: EmbeddingConfig,
    pub indexing: IndexingConfig,
    pub retrieval: RetrievalConfig,
    pub extraction: ChunkerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct IndexingConfig {
    pub batch_size: usize,
    /// Files indexed at once; unset picks a host-dependent default
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RetrievalConfig {
    pub top_k: usize,
    pub similarity_threshold: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(".codechat/store.json"),
            project_root: None,
            embedding: EmbeddingConfig::default(),
            indexing: IndexingConfig::default(),
            retrieval: RetrievalConfig::default(),
            extraction: ChunkerConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 1.3,
        }
    }
}

impl IndexingConfig {
    pub fn resolved_concurrency(&self) -> usize {
        self.concurrency
            .map(clamp_index_concurrency)
            .unwrap_or_else(default_index_concurrency)
    }
}

impl AppConfig {
    /// Load `explicit` (must exist) or `./codechat.toml` (if present), then apply
    /// environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `CODECHAT_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_empty(STORE_PATH_ENV) {
            self.store_path = PathBuf::from(path);
        }
        if let Some(root) = non_empty(PROJECT_ROOT_ENV) {
            self.project_root = Some(PathBuf::from(root));
        }
        if let Some(raw) = non_empty(EMBEDDING_MODE_ENV) {
            match EmbeddingMode::parse(&raw) {
                Some(mode) => self.embedding.mode = mode,
                None => log::warn!("Ignoring unknown {EMBEDDING_MODE_ENV}={raw}"),
            }
        }
        if let Some(model) = non_empty(EMBEDDING_MODEL_ENV) {
            self.embedding.model = model;
        }
        if let Some(url) = non_empty(OLLAMA_URL_ENV) {
            self.embedding.base_url = url;
        }
        if let Some(raw) = non_empty(INDEX_CONCURRENCY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(value) => self.indexing.concurrency = Some(clamp_index_concurrency(value)),
                Err(_) => log::warn!("Ignoring invalid {INDEX_CONCURRENCY_ENV}={raw}"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.indexing.batch_size == 0 {
            anyhow::bail!("indexing.batch_size must be > 0");
        }
        if self.retrieval.similarity_threshold.is_nan() {
            anyhow::bail!("retrieval.similarity_threshold must be a number");
        }
        if self.embedding.resolved_dimension() == 0 {
            anyhow::bail!("embedding.dimension must be > 0");
        }
        self.extraction
            .validate()
            .map_err(|e| anyhow::anyhow!("extraction: {e}"))?;
        Ok(())
    }
}
