use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use codechat_code_chunker::ChunkKind;
use std::path::PathBuf;

mod commands;
mod config;
mod flags;

use commands::{ChunksOptions, IndexOptions, QueryOptions};
use config::AppConfig;
use flags::EmbedMode;

#[derive(Parser)]
#[command(name = "codechat")]
#[command(about = "Ask questions about a C/C++ codebase", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./codechat.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vector store file (overrides config and CODECHAT_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, embed and store chunks of C/C++ files or directories
    Index(IndexArgs),

    /// Retrieve the chunks closest to a question
    Query(QueryArgs),

    /// Print the chunks extracted from one file (nothing is stored)
    Chunks(ChunksArgs),

    /// Show store location and size
    Stats(StatsArgs),

    /// Remove every stored chunk
    Clear,
}

#[derive(Args)]
struct IndexArgs {
    /// Files or directories (default: current directory)
    paths: Vec<PathBuf>,

    /// Chunks per store write
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: Option<u64>,

    /// Output stats as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct QueryArgs {
    /// Question or code fragment
    text: String,

    /// Neighbours requested from the store
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Keep results strictly below this distance
    #[arg(long)]
    threshold: Option<f32>,

    /// Only return chunks of this kind (function, test_case_function, class, struct,
    /// array_init, comment)
    #[arg(long)]
    kind: Option<ChunkKind>,

    /// Output chunks as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ChunksArgs {
    /// C or C++ source file
    file: PathBuf,

    /// Never nest member functions inside their class chunk
    #[arg(long)]
    strict: bool,

    /// Output chunks as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Index(args) => args.json,
        Commands::Query(args) => args.json,
        Commands::Chunks(args) => args.json,
        Commands::Stats(args) => args.json,
        Commands::Clear => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(mode) = cli.embed_mode {
        config.embedding.mode = mode.as_domain();
    }

    match cli.command {
        Commands::Index(args) => {
            let options = IndexOptions {
                paths: args.paths,
                batch_size: args
                    .batch_size
                    .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
                json: args.json,
            };
            commands::run_index(&config, options).await?;
        }
        Commands::Query(args) => {
            let options = QueryOptions {
                text: args.text,
                top_k: args.top_k,
                threshold: args.threshold,
                kind: args.kind,
                json: args.json,
            };
            commands::run_query(&config, options).await?;
        }
        Commands::Chunks(args) => {
            let options = ChunksOptions {
                file: args.file,
                strict: args.strict,
                json: args.json,
            };
            commands::run_chunks(&config, options)?;
        }
        Commands::Stats(args) => commands::run_stats(&config, args.json).await?,
        Commands::Clear => commands::run_clear(&config).await?,
    }

    Ok(())
}
