//! # IntraMate
//!
//! A retrieval-augmented question-answering service over private documents.
//!
//! IntraMate ingests documents (PDF, DOCX, Markdown, HTML, plain text),
//! chunks and embeds them into a SQLite vector store, and answers questions
//! grounded in the best-matching chunks — falling back to live web search
//! when the index has nothing relevant. A CLI and an HTTP API sit on top of
//! the same pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────┐
//! │  Extract  │──▶│   Pipeline    │──▶│  SQLite   │
//! │ PDF/DOCX/ │   │ Chunk+Embed  │   │ vectors   │
//! │ MD/HTML   │   └──────────────┘   └────┬─────┘
//! └───────────┘                           │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │(intramate)│      │  (axum)  │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! intramate init                          # create database
//! intramate upload ./handbook.pdf         # ingest a document
//! intramate ask "What is the leave policy?"
//! intramate documents                     # list indexed documents
//! intramate serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Per-format text extraction |
//! | [`chunk`] | Word-window chunking and chunk identity |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Deduplicated indexing into the vector store |
//! | [`retrieve`] | Similarity search with web fallback |
//! | [`websearch`] | Web-search provider abstraction |
//! | [`answer`] | Grounded answer and summary prompts |
//! | [`completion`] | Chat-completion provider abstraction |
//! | [`service`] | The assembled pipeline behind CLI and HTTP |
//! | [`server`] | HTTP API server |
//! | [`store`] | SQLite vector store |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod migrate;
pub mod models;
pub mod retrieve;
pub mod server;
pub mod service;
pub mod store;
pub mod websearch;
