//! Retriever: similarity search with a web-search fallback.
//!
//! The query is embedded and matched against the index. Any hit at all means
//! the documents path wins; zero hits (or a search failure, which is logged
//! but deliberately not propagated — the user should get some answer path)
//! falls back to web search.

use anyhow::Result;

use crate::embedding::Embedder;
use crate::models::{DocumentHit, RetrievalResult, SourceType};
use crate::store::VectorStore;
use crate::websearch::{self, WebSearch};

/// Preview length surfaced with each document hit.
const PREVIEW_CHARS: usize = 180;

/// First 180 characters plus an ellipsis marker when truncated; shorter
/// texts pass through unchanged.
pub fn preview(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > PREVIEW_CHARS {
        let mut p: String = chars[..PREVIEW_CHARS].iter().collect();
        p.push_str("...");
        p
    } else {
        text.to_string()
    }
}

/// Retrieve grounding context for `query`: the `top_k` nearest index
/// entries, or web-search results when the index has nothing.
pub async fn retrieve(
    query: &str,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    web: &dyn WebSearch,
    top_k: usize,
    web_limit: usize,
) -> RetrievalResult {
    let hits = match search_index(query, embedder, store, top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            // Degraded path: an outage looks like an empty index to the
            // caller, but the diagnostic stays distinguishable for operators.
            tracing::error!(error = %e, "index search failed, falling back to web");
            Vec::new()
        }
    };

    if !hits.is_empty() {
        tracing::info!(hits = hits.len(), "found relevant documents");
        let context = hits
            .iter()
            .map(|h| h.entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let document_hits = hits
            .iter()
            .map(|h| DocumentHit {
                source: h.entry.source.clone(),
                preview: preview(&h.entry.text),
            })
            .collect();
        return RetrievalResult {
            source_type: SourceType::Documents,
            document_hits,
            web_citations: Vec::new(),
            context,
        };
    }

    tracing::info!("no relevant documents found, falling back to web search");
    let (context, web_citations) = websearch::lookup(web, query, web_limit).await;
    tracing::info!(citations = web_citations.len(), "web fallback complete");

    RetrievalResult {
        source_type: SourceType::Web,
        document_hits: Vec::new(),
        web_citations,
        context,
    }
}

async fn search_index(
    query: &str,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    top_k: usize,
) -> Result<Vec<crate::models::ScoredEntry>> {
    let query_vec = embedder.embed(query).await?;
    // Hit order is exactly the store's ranking; no re-ranking here.
    store.query(&query_vec, top_k).await
}
