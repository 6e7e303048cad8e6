use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use flags::{collect_meta, parse_meta, EmbedMode};
use output::{
    format_metadata, preview, print_hits, GetOutput, IdOutput, ListOutput, SearchOutput,
    StatsOutput,
};
use ragdb_chunker::{Chunker, ChunkerConfig, DEFAULT_CHUNK_WORDS};
use ragdb_ingest::Ingestor;
use ragdb_vector_store::{Document, DocumentStore, EmbeddingConfig, MetadataValue, StoreConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

mod flags;
mod output;

#[derive(Parser)]
#[command(name = "ragdb")]
#[command(about = "Embedded document vector store for retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file (overrides RAGDB_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Embedding dimension (overrides RAGDB_EMBEDDING_DIM)
    #[arg(long, global = true)]
    dimension: Option<usize>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one document
    Add(AddArgs),

    /// Chunk files and add every chunk as a document
    Ingest(IngestArgs),

    /// Show a document by id
    Get(GetArgs),

    /// List documents in insertion order
    List(ListArgs),

    /// Replace the text of a document, merging metadata
    Update(UpdateArgs),

    /// Delete a document by id
    Delete(DeleteArgs),

    /// Find the documents closest to a query
    Search(SearchArgs),

    /// Show store statistics
    Stats(StatsArgs),
}

#[derive(Args)]
struct AddArgs {
    /// Document text
    text: String,

    /// Metadata entry (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    meta: Vec<(String, MetadataValue)>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IngestArgs {
    /// Files to ingest (txt, md, csv, json, html, log)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Words per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_WORDS)]
    chunk_size: usize,

    /// Words shared by consecutive chunks
    #[arg(long, default_value_t = 0)]
    overlap: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GetArgs {
    id: String,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ListArgs {
    /// Records to skip
    #[arg(long, default_value_t = 0)]
    skip: usize,

    /// Maximum records to return
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct UpdateArgs {
    id: String,

    /// New document text
    text: String,

    /// Metadata entry to set or overwrite (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    meta: Vec<(String, MetadataValue)>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DeleteArgs {
    id: String,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(short = 'k', long, default_value_t = 4)]
    k: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

impl Commands {
    const fn json(&self) -> bool {
        match self {
            Self::Add(args) => args.json,
            Self::Ingest(args) => args.json,
            Self::Get(args) => args.json,
            Self::List(args) => args.json,
            Self::Update(args) => args.json,
            Self::Delete(args) => args.json,
            Self::Search(args) => args.json,
            Self::Stats(args) => args.json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON parsing
    if cli.command.json() {
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

    let store = open_store(&cli).await?;

    match cli.command {
        Commands::Add(args) => run_add(&store, args).await?,
        Commands::Ingest(args) => run_ingest(store, args).await?,
        Commands::Get(args) => run_get(&store, args).await?,
        Commands::List(args) => run_list(&store, args).await?,
        Commands::Update(args) => run_update(&store, args).await?,
        Commands::Delete(args) => run_delete(&store, args).await?,
        Commands::Search(args) => run_search(&store, args).await?,
        Commands::Stats(args) => run_stats(&store, args).await?,
    }

    Ok(())
}

async fn open_store(cli: &Cli) -> Result<Arc<DocumentStore>> {
    let mut store_cfg = StoreConfig::from_env().context("Invalid store configuration")?;
    let mut embed_cfg = EmbeddingConfig::from_env().context("Invalid embedding configuration")?;

    if let Some(path) = &cli.store {
        store_cfg.snapshot_path = path.clone();
    }
    if let Some(dimension) = cli.dimension {
        store_cfg.dimension = dimension;
    }
    if let Some(mode) = cli.embed_mode {
        embed_cfg.mode = mode.as_domain();
    }
    embed_cfg.dimension = store_cfg.dimension;

    let embedder = embed_cfg.build_provider()?;
    let store = DocumentStore::open_with_config(store_cfg, embedder)
        .await
        .context("Failed to open document store")?;
    Ok(Arc::new(store))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_add(store: &DocumentStore, args: AddArgs) -> Result<()> {
    let mut document = Document::new(args.text);
    document.metadata = collect_meta(args.meta);
    let id = store.add(document).await?;

    if args.json {
        print_json(&IdOutput { id, status: "added" })?;
    } else {
        println!("{id}");
    }
    Ok(())
}

async fn run_ingest(store: Arc<DocumentStore>, args: IngestArgs) -> Result<()> {
    let config = ChunkerConfig::new(args.chunk_size).with_overlap(args.overlap);
    let chunker = Chunker::new(config)?;
    let ingestor = Ingestor::new(store, chunker);
    let stats = ingestor.ingest_paths(&args.files).await;

    if args.json {
        print_json(&stats)?;
    } else {
        println!(
            "Ingested {} sources: {} chunks, {} stored in {}ms",
            stats.sources, stats.chunks, stats.documents_added, stats.time_ms
        );
        for error in &stats.errors {
            eprintln!("  error: {error}");
        }
    }

    if stats.sources == 0 && stats.has_errors() {
        anyhow::bail!("No files could be ingested");
    }
    Ok(())
}

async fn run_get(store: &DocumentStore, args: GetArgs) -> Result<()> {
    let Some(document) = store.get(&args.id).await else {
        anyhow::bail!("Document not found: {}", args.id);
    };

    if args.json {
        print_json(&GetOutput {
            id: args.id,
            document,
        })?;
    } else {
        if !document.metadata.is_empty() {
            println!("# {}", format_metadata(&document.metadata));
        }
        println!("{}", document.text);
    }
    Ok(())
}

async fn run_list(store: &DocumentStore, args: ListArgs) -> Result<()> {
    let total = store.len().await;
    let documents = store.list(args.skip, args.limit).await;

    if args.json {
        print_json(&ListOutput {
            total,
            skip: args.skip,
            limit: args.limit,
            documents,
        })?;
    } else {
        for entry in &documents {
            println!("{}  {}", entry.id, preview(&entry.document.text, 80));
        }
        println!(
            "Showing {} of {total} documents (skip {})",
            documents.len(),
            args.skip
        );
    }
    Ok(())
}

async fn run_update(store: &DocumentStore, args: UpdateArgs) -> Result<()> {
    let patch = (!args.meta.is_empty()).then(|| collect_meta(args.meta));
    if !store.update(&args.id, args.text, patch).await? {
        anyhow::bail!("Document not found: {}", args.id);
    }

    if args.json {
        print_json(&IdOutput {
            id: args.id,
            status: "updated",
        })?;
    } else {
        println!("Updated {}", args.id);
    }
    Ok(())
}

async fn run_delete(store: &DocumentStore, args: DeleteArgs) -> Result<()> {
    if !store.delete(&args.id).await? {
        anyhow::bail!("Document not found: {}", args.id);
    }

    if args.json {
        print_json(&IdOutput {
            id: args.id,
            status: "deleted",
        })?;
    } else {
        println!("Deleted {}", args.id);
    }
    Ok(())
}

async fn run_search(store: &DocumentStore, args: SearchArgs) -> Result<()> {
    let hits = store.search(&args.query, args.k).await?;

    if args.json {
        print_json(&SearchOutput {
            query: args.query,
            k: args.k,
            hits,
        })?;
    } else {
        print_hits(&hits);
    }
    Ok(())
}

async fn run_stats(store: &DocumentStore, args: StatsArgs) -> Result<()> {
    let stats = store.stats().await;

    if args.json {
        print_json(&StatsOutput {
            snapshot: store.snapshot_path().to_path_buf(),
            stats,
        })?;
    } else {
        println!("Snapshot:   {}", store.snapshot_path().display());
        println!("Documents:  {}", stats.documents);
        println!("Index rows: {}", stats.index_rows);
        println!("Dimension:  {}", stats.dimension);
    }
    Ok(())
}
