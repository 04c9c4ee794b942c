use crate::config::AppConfig;
use anyhow::{Context, Result};
use codechat_code_chunker::{Chunk, ChunkKind, Chunker, ChunkerConfig};
use codechat_indexer::{ChunkIndexer, IndexerConfig};
use codechat_search::{RetrievalRequest, Retriever};
use codechat_vector_store::{embedder_from_config, Embedder, LocalVectorStore, VectorStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) struct IndexOptions {
    pub paths: Vec<PathBuf>,
    pub batch_size: Option<usize>,
    pub json: bool,
}

pub(crate) struct QueryOptions {
    pub text: String,
    pub top_k: Option<usize>,
    pub threshold: Option<f32>,
    pub kind: Option<ChunkKind>,
    pub json: bool,
}

pub(crate) struct ChunksOptions {
    pub file: PathBuf,
    pub strict: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct StoreStatus<'a> {
    store_path: &'a Path,
    entries: usize,
    dimension: usize,
    metric: &'static str,
    embedding_mode: &'static str,
    embedding_model: &'a str,
}

fn build_embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    embedder_from_config(&config.embedding).context("Failed to build embedder")
}

async fn open_store(config: &AppConfig) -> Result<Arc<LocalVectorStore>> {
    let store = LocalVectorStore::open(
        &config.store_path,
        config.embedding.resolved_dimension(),
        config.embedding.metric,
    )
    .await
    .with_context(|| format!("Failed to open store {}", config.store_path.display()))?;
    Ok(Arc::new(store))
}

fn build_chunker(config: ChunkerConfig) -> Result<Chunker> {
    Chunker::new(config).context("Failed to load C/C++ grammars")
}

pub(crate) async fn run_index(config: &AppConfig, options: IndexOptions) -> Result<()> {
    let store = open_store(config).await?;
    let indexer_config = IndexerConfig {
        batch_size: options.batch_size.unwrap_or(config.indexing.batch_size),
        concurrency: config.indexing.resolved_concurrency(),
    };
    let mut indexer = ChunkIndexer::with_config(
        build_chunker(config.extraction.clone())?,
        build_embedder(config)?,
        store,
        indexer_config,
    );
    if let Some(root) = &config.project_root {
        indexer = indexer.with_project_root(root);
    }

    let paths = if options.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        options.paths
    };
    let stats = indexer
        .index_paths(&paths)
        .await
        .context("Failed to index")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Indexed {stats}");
        for warning in &stats.warnings {
            eprintln!("warning: {warning}");
        }
        for error in &stats.errors {
            eprintln!("error: {error}");
        }
    }
    Ok(())
}

pub(crate) async fn run_query(config: &AppConfig, options: QueryOptions) -> Result<()> {
    let store = open_store(config).await?;
    let retriever = Retriever::new(build_embedder(config)?, store);

    let mut request = RetrievalRequest::new(
        options.text,
        options.top_k.unwrap_or(config.retrieval.top_k),
        options
            .threshold
            .unwrap_or(config.retrieval.similarity_threshold),
    );
    if let Some(kind) = options.kind {
        request = request.kind(kind);
    }

    let chunks = retriever.retrieve(&request).await?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    if chunks.is_empty() {
        println!("No chunks within distance {}", request.similarity_threshold);
    }
    for (rank, chunk) in chunks.iter().enumerate() {
        println!(
            "{}. {} (distance {:.4})",
            rank + 1,
            describe(chunk),
            chunk.distance.unwrap_or(f32::NAN)
        );
        for line in chunk.content.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}

pub(crate) fn run_chunks(config: &AppConfig, options: ChunksOptions) -> Result<()> {
    let chunker_config = if options.strict {
        ChunkerConfig {
            nest_members_in_scopes: false,
            ..config.extraction.clone()
        }
    } else {
        config.extraction.clone()
    };
    let chunker = build_chunker(chunker_config)?;

    let source = options.file.to_string_lossy().replace('\\', "/");
    let extraction = chunker.extract_file_as(&options.file, &source);
    if let Some(warning) = extraction.warnings.first() {
        anyhow::bail!("{warning}");
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&extraction.chunks)?);
        return Ok(());
    }

    for chunk in &extraction.chunks {
        println!("{}", describe(chunk));
    }
    println!("{}", Chunker::get_stats(&extraction.chunks));
    Ok(())
}

pub(crate) async fn run_stats(config: &AppConfig, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let status = StoreStatus {
        store_path: &config.store_path,
        entries: store.count().await?,
        dimension: store.dimension(),
        metric: store.metric().as_str(),
        embedding_mode: config.embedding.mode.as_str(),
        embedding_model: &config.embedding.model,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("store:     {}", status.store_path.display());
        println!("entries:   {}", status.entries);
        println!("dimension: {} ({})", status.dimension, status.metric);
        println!(
            "embedding: {} ({})",
            status.embedding_mode, status.embedding_model
        );
    }
    Ok(())
}

pub(crate) async fn run_clear(config: &AppConfig) -> Result<()> {
    let store = open_store(config).await?;
    let removed = store.count().await?;
    store.clear().await?;
    println!("Removed {removed} entries from {}", config.store_path.display());
    Ok(())
}

fn describe(chunk: &Chunk) -> String {
    let location = if chunk.start_line == chunk.end_line {
        format!("{}:{}", chunk.source, chunk.start_line)
    } else {
        format!("{}:{}-{}", chunk.source, chunk.start_line, chunk.end_line)
    };
    let scope = chunk
        .class_name
        .as_deref()
        .or(chunk.struct_name.as_deref())
        .filter(|_| chunk.kind.is_function());
    match (chunk.display_name(), scope) {
        (Some(name), Some(scope)) => format!("{location} {} {scope}::{name}", chunk.kind),
        (Some(name), None) => format!("{location} {} {name}", chunk.kind),
        (None, _) => format!("{location} {}", chunk.kind),
    }
}
