//! # IntraMate CLI (`intramate`)
//!
//! The `intramate` binary drives the document question-answering pipeline
//! from the command line: database initialization, document upload,
//! question answering, summarization, document listing and deletion, and
//! starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! intramate --config ./config/intramate.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `intramate init` | Create the SQLite database and run schema migrations |
//! | `intramate upload <path>` | Extract, chunk, embed, and index a document |
//! | `intramate ask "<question>"` | Answer a question grounded in the index |
//! | `intramate summarize "<text>"` | Summarize text into a chosen language |
//! | `intramate documents` | List indexed documents with chunk counts |
//! | `intramate delete <source>` | Remove all entries for a document |
//! | `intramate serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! intramate init --config ./config/intramate.toml
//!
//! # Ingest a PDF
//! intramate upload ./docs/handbook.pdf
//!
//! # Ask in a specific language
//! intramate ask "Wie viele Urlaubstage habe ich?" --language German
//!
//! # Start the HTTP API
//! intramate serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use intramate::config;
use intramate::models::SourceType;
use intramate::server;
use intramate::service::RagService;
use intramate::store::SqliteStore;

/// IntraMate CLI — retrieval-augmented question answering over private
/// documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/intramate.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "intramate",
    about = "IntraMate — retrieval-augmented question answering over private documents",
    version,
    long_about = "IntraMate ingests documents (PDF, DOCX, Markdown, HTML, plain text), chunks \
    and embeds them into a SQLite vector store, and answers questions grounded in the \
    best-matching chunks, falling back to live web search when the index has nothing relevant."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/intramate.toml`. Store, chunking, retrieval,
    /// provider, and server settings are read from this file. A missing or
    /// empty file yields the documented defaults.
    #[arg(long, global = true, default_value = "./config/intramate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the index-entry table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Extract, chunk, embed, and index a document.
    ///
    /// The file name becomes the document's source identifier. Re-uploading
    /// the same document is a no-op: every chunk deduplicates against its
    /// content identity.
    Upload {
        /// Path to the document (pdf, docx, md, html, txt).
        path: PathBuf,
    },

    /// Answer a question grounded in the indexed documents.
    ///
    /// Retrieves the best-matching chunks, or falls back to web search when
    /// the index has no relevant content, and prints the answer with its
    /// sources.
    Ask {
        /// The question to answer.
        question: String,

        /// Language the answer should be written in.
        #[arg(long, default_value = "English")]
        language: String,
    },

    /// Summarize arbitrary text.
    ///
    /// Input beyond the configured character cap is truncated before
    /// summarization.
    Summarize {
        /// The text to summarize.
        text: String,

        /// Language the summary should be written in.
        #[arg(long, default_value = "English")]
        language: String,
    },

    /// List indexed documents with chunk counts and previews.
    Documents,

    /// Delete every index entry for a document.
    Delete {
        /// Source identifier (the uploaded file name).
        source: String,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// upload, chat, summarize, and document-management endpoints.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // A missing config file falls back to defaults; Init should work in a
    // fresh checkout before any config exists.
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::default()
    };

    match cli.command {
        Commands::Init => {
            // Opening the store creates the file and runs migrations.
            let _store = SqliteStore::open(&cfg.store.path).await?;
            println!("Database initialized at {}", cfg.store.path.display());
        }
        Commands::Upload { path } => {
            let service = RagService::from_config(cfg).await?;
            let outcome = service.upload_document(&path).await?;
            println!(
                "Processed {} into {} chunks ({} new)",
                path.display(),
                outcome.chunks,
                outcome.inserted
            );
        }
        Commands::Ask { question, language } => {
            let service = RagService::from_config(cfg).await?;
            let outcome = service.ask_question(&question, &language).await?;

            println!("{}", outcome.answer);
            println!();
            match outcome.retrieval.source_type {
                SourceType::Documents => {
                    println!("Sources (documents):");
                    for hit in &outcome.retrieval.document_hits {
                        println!("  - {}: {}", hit.source, hit.preview);
                    }
                }
                SourceType::Web => {
                    if outcome.retrieval.web_citations.is_empty() {
                        println!("Sources: none");
                    } else {
                        println!("Sources (web):");
                        for citation in &outcome.retrieval.web_citations {
                            println!("  - {} <{}>", citation.title, citation.url);
                        }
                    }
                }
            }
        }
        Commands::Summarize { text, language } => {
            let service = RagService::from_config(cfg).await?;
            let summary = service.summarize_text(&text, &language).await?;
            println!("{}", summary);
        }
        Commands::Documents => {
            let service = RagService::from_config(cfg).await?;
            let documents = service.list_documents().await?;
            if documents.is_empty() {
                println!("No documents indexed.");
            } else {
                for doc in &documents {
                    println!("{} ({} chunks)", doc.source, doc.chunks);
                    for preview in &doc.previews {
                        println!("    {}", preview);
                    }
                }
            }
        }
        Commands::Delete { source } => {
            let service = RagService::from_config(cfg).await?;
            let removed = service.delete_document(&source).await?;
            println!("Deleted {} ({} chunks)", source, removed);
        }
        Commands::Serve => {
            let service = Arc::new(RagService::from_config(cfg).await?);
            server::run_server(service).await?;
        }
    }

    Ok(())
}
