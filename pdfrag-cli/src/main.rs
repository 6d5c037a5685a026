//! pdfrag CLI - index PDF papers into Qdrant and search them
//!
//! # Commands
//!
//! ```bash
//! # Chunk, embed and store the configured papers
//! pdfrag ingest
//!
//! # Search the collection (defaults to the configured query)
//! pdfrag query "What is Attention?" -k 4
//!
//! # Show how a file is chunked
//! pdfrag chunk PDFs/BERT.pdf
//!
//! # Embed text and show vector stats
//! pdfrag embed "What is Attention?" --query
//!
//! # Ingest into memory and search in one go, no Qdrant needed
//! pdfrag demo "What is Attention?"
//!
//! # Print the effective configuration
//! pdfrag config
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdfrag_lib::{
    chunk::{Chunk, Chunker, RecursiveCharacterSplitter},
    config::{EmbeddingProvider, Settings, DEFAULT_CONFIG_FILE},
    embed::{BgeEmbedder, Embedder, OpenAiEmbedder},
    loader::{DocumentLoader, FileLoader},
    pipeline::Pipeline,
    store::{MemoryStore, QdrantStore, SearchResult},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdfrag")]
#[command(about = "Chunk, embed and search PDF papers")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); missing files fall back to defaults
    #[arg(short, long, global = true, env = "PDFRAG_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, chunk, embed and store the configured documents
    Ingest,

    /// Search the vector store
    Query {
        /// Query text (defaults to search.query from the configuration)
        text: Option<String>,

        /// Number of results to return
        #[arg(short)]
        k: Option<usize>,
    },

    /// Chunk a single file and show the result
    Chunk {
        /// PDF or text file to chunk
        input: PathBuf,

        /// Override chunking.chunk_size
        #[arg(long)]
        size: Option<usize>,

        /// Override chunking.chunk_overlap
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (uses query prompt prefix where the model has one)
        #[arg(short, long)]
        query: bool,
    },

    /// Ingest into an in-memory store and search it (all in one command)
    Demo {
        /// Query text (defaults to search.query from the configuration)
        text: Option<String>,

        /// Number of results to return
        #[arg(short)]
        k: Option<usize>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so results on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Config => {
            print!("{}", settings.to_redacted_toml()?);
            Ok(())
        }
        Commands::Chunk {
            input,
            size,
            overlap,
        } => chunk_file(&settings, &input, size, overlap),
        command => match settings.embedding.provider {
            EmbeddingProvider::OpenAi => {
                let embedder = OpenAiEmbedder::from_config(&settings.embedding)?;
                run(embedder, &settings, command).await
            }
            EmbeddingProvider::FastEmbed => {
                eprintln!("Loading BGE model (first run downloads ~1.2GB)...");
                let embedder = BgeEmbedder::new()?;
                run(embedder, &settings, command).await
            }
        },
    }
}

/// Commands that need an embedder.
async fn run<E: Embedder>(mut embedder: E, settings: &Settings, command: Commands) -> Result<()> {
    match command {
        Commands::Ingest => {
            let store = QdrantStore::from_config(&settings.store)?;
            let mut pipeline = Pipeline::new(settings, FileLoader, embedder, store)?;

            let summary = pipeline.ingest().await?;
            println!(
                "Documents injected into Qdrant collection '{}': {} pages, {} chunks.",
                settings.store.collection, summary.documents, summary.chunks
            );
        }

        Commands::Query { text, k } => {
            let store = QdrantStore::from_config(&settings.store)?;
            let mut pipeline = Pipeline::new(settings, FileLoader, embedder, store)?;

            let query = text.unwrap_or_else(|| settings.search.query.clone());
            let results = pipeline.query(&query, k).await?;
            print_results(&results);
        }

        Commands::Demo { text, k } => {
            let mut pipeline = Pipeline::new(settings, FileLoader, embedder, MemoryStore::new())?;

            let summary = pipeline.ingest().await?;
            eprintln!(
                "Indexed {} chunks from {} pages in memory",
                summary.chunks, summary.documents
            );

            let query = text.unwrap_or_else(|| settings.search.query.clone());
            let results = pipeline.query(&query, k).await?;
            print_results(&results);
        }

        Commands::Embed { text, query } => {
            let embedding = if query {
                println!("Embedding as query: {text}");
                embedder.embed_query(&text).await?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])
                    .await?
                    .into_iter()
                    .next()
                    .context("embedder returned no vectors")?
            };

            let first: Vec<f32> = embedding.iter().take(5).copied().collect();
            println!("\nEmbedding stats ({}):", embedder.model_name());
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {first:?}");
            println!("  Min: {:.4}", embedding.iter().copied().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max));
        }

        Commands::Chunk { .. } | Commands::Config => unreachable!("handled without an embedder"),
    }

    Ok(())
}

fn chunk_file(
    settings: &Settings,
    input: &Path,
    size: Option<usize>,
    overlap: Option<usize>,
) -> Result<()> {
    let mut config = settings.chunking.splitter();
    if let Some(size) = size {
        config.chunk_size = size;
    }
    if let Some(overlap) = overlap {
        config.chunk_overlap = overlap;
    }
    let splitter = RecursiveCharacterSplitter::new(config)?;

    let documents = FileLoader.load(input)?;
    let chunks = splitter.split_documents(&documents);

    println!(
        "Chunked '{}' ({} pages) into {} chunks using {} strategy:\n",
        input.display(),
        documents.len(),
        chunks.len(),
        splitter.name()
    );
    for (i, chunk) in chunks.iter().enumerate() {
        print_chunk_header(i + 1, chunk);
        // Show preview (first 200 chars)
        let preview: String = chunk.content.chars().take(200).collect();
        let ellipsis = if chunk.content.chars().count() > 200 { "..." } else { "" };
        println!("{preview}{ellipsis}\n");
    }

    Ok(())
}

fn print_chunk_header(n: usize, chunk: &Chunk) {
    let page = chunk
        .metadata
        .get("page")
        .map_or_else(|| "-".to_string(), ToString::to_string);
    println!(
        "--- Chunk {n} ({} chars, page {page}, offset {}, id: {}) ---",
        chunk.content.chars().count(),
        chunk.metadata.start_index,
        &chunk.id[..8.min(chunk.id.len())]
    );
}

fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        tracing::debug!(
            rank = i + 1,
            score = result.score,
            source = result.chunk.metadata.source().unwrap_or("-"),
            "match"
        );
        println!("\n--- Chunk {} ---\n{}", i + 1, result.chunk.content);
    }
}
