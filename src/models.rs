//! Core data types flowing through the indexing and retrieval pipeline.

use serde::Serialize;

/// A single extracted page of a document. Formats without page structure
/// produce one `PageText` with `page = None`.
#[derive(Debug, Clone)]
pub struct PageText {
    pub text: String,
    pub page: Option<i64>,
}

/// One overlapping window of a document's text, ready for indexing.
/// Immutable once created; persisted only in vector form.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub page: Option<i64>,
}

/// An entry written to the vector store.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub source: String,
    pub page: Option<i64>,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// An entry as read back from the store, without its vector.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub id: String,
    pub source: String,
    pub page: Option<i64>,
    pub text: String,
}

/// A similarity-search hit, best-match-first per the store's ranking.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: StoredEntry,
    pub score: f32,
}

/// Where a query's grounding context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Documents,
    Web,
}

/// A document hit surfaced to the caller alongside the answer.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentHit {
    pub source: String,
    pub preview: String,
}

/// A web citation from the search fallback.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// Per-query retrieval outcome. Built per request, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub source_type: SourceType,
    pub document_hits: Vec<DocumentHit>,
    pub web_citations: Vec<Citation>,
    pub context: String,
}

/// Grouped-by-source view of the index, for document listing.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub source: String,
    pub chunks: usize,
    pub previews: Vec<String>,
}
