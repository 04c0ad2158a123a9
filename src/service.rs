//! Outward-facing operations: upload, ask, summarize, list, delete.
//!
//! [`RagService`] wires the pipeline together and is consumed by both the
//! CLI and the HTTP server. Every external capability is injected behind a
//! trait object, so tests run the full pipeline with doubles.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::answer;
use crate::chunk::chunk_words;
use crate::completion::{ChatModel, OpenAiChat};
use crate::config::Config;
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::Error;
use crate::extract::extract_file;
use crate::index::index_chunks;
use crate::models::{Chunk, DocumentSummary, RetrievalResult};
use crate::retrieve::{preview, retrieve};
use crate::store::{SqliteStore, VectorStore};
use crate::websearch::{TavilySearch, WebSearch};

/// Maximum previews kept per document in listings.
const PREVIEWS_PER_DOCUMENT: usize = 3;

/// Result of an upload: total chunks produced and how many were new.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub chunks: usize,
    pub inserted: usize,
}

/// Result of a question: the answer plus its grounding provenance.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    pub answer: String,
    pub retrieval: RetrievalResult,
}

pub struct RagService {
    config: Config,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    web: Arc<dyn WebSearch>,
    // Serializes the duplicate-check-then-insert window of concurrent
    // uploads; the store's last-writer-wins upsert covers everything else.
    index_lock: tokio::sync::Mutex<()>,
}

impl RagService {
    /// Build a service with injected collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        web: Arc<dyn WebSearch>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
            chat,
            web,
            index_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Build the production service: SQLite store at the configured path,
    /// OpenAI embedder and chat model, Tavily web search. Credential
    /// problems surface here, before any request work begins.
    pub async fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let store = SqliteStore::open(&config.store.path).await?;
        let embedder = OpenAiEmbedder::new(&config.embedding)?;
        let chat = OpenAiChat::new(&config.completion)?;
        let web = TavilySearch::new(&config.websearch)?;

        Ok(Self::new(
            config,
            Arc::new(store),
            Arc::new(embedder),
            Arc::new(chat),
            Arc::new(web),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract, chunk, and index a document file. The source identifier is
    /// the file name.
    pub async fn upload_document(&self, path: &Path) -> Result<UploadOutcome> {
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?
            .to_string();

        let pages = extract_file(path)?;

        let mut chunks: Vec<Chunk> = Vec::new();
        for page in &pages {
            for window in chunk_words(
                &page.text,
                self.config.chunking.window_words,
                self.config.chunking.overlap_words,
            )? {
                chunks.push(Chunk {
                    text: window,
                    source: source.clone(),
                    page: page.page,
                });
            }
        }

        if chunks.is_empty() {
            return Err(Error::Extraction(format!(
                "no content could be extracted from {}",
                source
            ))
            .into());
        }

        let _guard = self.index_lock.lock().await;
        let inserted = index_chunks(self.store.as_ref(), self.embedder.as_ref(), &chunks).await?;

        tracing::info!(source = %source, chunks = chunks.len(), inserted, "document processed");
        Ok(UploadOutcome {
            chunks: chunks.len(),
            inserted,
        })
    }

    /// Retrieve grounding for `question` and generate a localized answer.
    pub async fn ask_question(&self, question: &str, language: &str) -> Result<AskOutcome> {
        let retrieval = retrieve(
            question,
            self.embedder.as_ref(),
            self.store.as_ref(),
            self.web.as_ref(),
            self.config.retrieval.top_k,
            self.config.websearch.limit,
        )
        .await;

        let answer = answer::answer(self.chat.as_ref(), question, &retrieval.context, language)
            .await?;

        Ok(AskOutcome { answer, retrieval })
    }

    /// Localized summary of arbitrary text.
    pub async fn summarize_text(&self, text: &str, language: &str) -> Result<String> {
        answer::summarize(
            self.chat.as_ref(),
            text,
            language,
            self.config.completion.summary_max_chars,
        )
        .await
    }

    /// Grouped-by-source view of the index: chunk count and up to three
    /// previews per document. There is no separate catalog; the listing is
    /// reconstructed from entry metadata.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let entries = self.store.list_all().await?;

        let mut grouped: BTreeMap<String, DocumentSummary> = BTreeMap::new();
        for entry in entries {
            let summary = grouped
                .entry(entry.source.clone())
                .or_insert_with(|| DocumentSummary {
                    name: Path::new(&entry.source)
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(&entry.source)
                        .to_string(),
                    source: entry.source.clone(),
                    chunks: 0,
                    previews: Vec::new(),
                });
            summary.chunks += 1;
            if summary.previews.len() < PREVIEWS_PER_DOCUMENT {
                summary.previews.push(preview(&entry.text));
            }
        }

        Ok(grouped.into_values().collect())
    }

    /// Delete every index entry for `source`. Fails with [`Error::NotFound`]
    /// when the source has no entries.
    pub async fn delete_document(&self, source: &str) -> Result<u64> {
        let removed = self.store.delete_source(source).await?;
        if removed == 0 {
            return Err(Error::NotFound(format!("document not found: {}", source)).into());
        }
        tracing::info!(source = %source, removed, "document deleted");
        Ok(removed)
    }
}
