//! Indexer: deduplicated insertion of chunks into the vector store.
//!
//! Identity-based dedup makes indexing idempotent: re-uploading the same
//! document inserts nothing. Embedding failure aborts the whole call; a
//! single failed upsert loses only that entry.

use anyhow::Result;

use crate::chunk::chunk_id;
use crate::embedding::{embed_all, Embedder};
use crate::models::{Chunk, IndexEntry};
use crate::store::VectorStore;

/// Index `chunks` into `store`, skipping entries whose identity already
/// exists. Returns the count actually inserted (excludes skipped duplicates
/// and failed upserts).
pub async fn index_chunks(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    chunks: &[Chunk],
) -> Result<usize> {
    // A fresh store has no prior state; failure to read identities is not
    // fatal, it just disables dedup for this call.
    let existing = match store.list_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "could not read existing identities, assuming empty store");
            Default::default()
        }
    };

    let fresh: Vec<(String, &Chunk)> = chunks
        .iter()
        .enumerate()
        .filter_map(|(ordinal, chunk)| {
            let id = chunk_id(&chunk.source, ordinal, &chunk.text);
            if existing.contains(&id) {
                None
            } else {
                Some((id, chunk))
            }
        })
        .collect();

    if fresh.is_empty() {
        tracing::info!("no new chunks to insert");
        return Ok(0);
    }

    // Fatal on failure: there is no answer path without vectors.
    let texts: Vec<String> = fresh.iter().map(|(_, c)| c.text.clone()).collect();
    let embeddings = embed_all(embedder, &texts).await?;

    let mut inserted = 0usize;
    for ((id, chunk), embedding) in fresh.into_iter().zip(embeddings) {
        let entry = IndexEntry {
            id: id.clone(),
            source: chunk.source.clone(),
            page: chunk.page,
            text: chunk.text.clone(),
            embedding,
        };
        match store.upsert(&entry).await {
            Ok(()) => inserted += 1,
            Err(e) => {
                // One bad entry must not abort the batch.
                tracing::warn!(id = %id, error = %e, "failed to insert entry");
            }
        }
    }

    tracing::info!(inserted, "added new chunks to vector store");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use crate::models::{ScoredEntry, StoredEntry};

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    /// In-memory store; optionally fails upserts for ids in `reject`.
    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<Vec<IndexEntry>>,
        reject: HashSet<String>,
        fail_list_ids: bool,
    }

    #[async_trait]
    impl VectorStore for MemoryStore {
        async fn upsert(&self, entry: &IndexEntry) -> Result<()> {
            if self.reject.contains(&entry.id) {
                return Err(anyhow!("store rejected {}", entry.id));
            }
            let mut entries = self.entries.lock().unwrap();
            entries.retain(|e| e.id != entry.id);
            entries.push(entry.clone());
            Ok(())
        }

        async fn query(&self, _embedding: &[f32], _top_k: usize) -> Result<Vec<ScoredEntry>> {
            Ok(Vec::new())
        }

        async fn list_ids(&self) -> Result<HashSet<String>> {
            if self.fail_list_ids {
                return Err(anyhow!("store unreadable"));
            }
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.id.clone())
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<StoredEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .map(|e| StoredEntry {
                    id: e.id.clone(),
                    source: e.source.clone(),
                    page: e.page,
                    text: e.text.clone(),
                })
                .collect())
        }

        async fn delete_source(&self, source: &str) -> Result<u64> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.source != source);
            Ok((before - entries.len()) as u64)
        }
    }

    fn chunks(source: &str, texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .map(|t| Chunk {
                text: t.to_string(),
                source: source.to_string(),
                page: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn indexing_is_idempotent() {
        let store = MemoryStore::default();
        let batch = chunks("doc.txt", &["alpha chunk", "beta chunk", "gamma chunk"]);

        let first = index_chunks(&store, &UnitEmbedder, &batch).await.unwrap();
        assert_eq!(first, 3);

        let second = index_chunks(&store, &UnitEmbedder, &batch).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.entries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn repeated_text_at_different_positions_is_kept() {
        let store = MemoryStore::default();
        let batch = chunks("doc.txt", &["same text", "same text"]);

        let inserted = index_chunks(&store, &UnitEmbedder, &batch).await.unwrap();
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn single_upsert_failure_does_not_abort_batch() {
        let batch = chunks("doc.txt", &["alpha chunk", "beta chunk", "gamma chunk"]);
        let bad_id = chunk_id("doc.txt", 1, "beta chunk");
        let store = MemoryStore {
            reject: HashSet::from([bad_id]),
            ..Default::default()
        };

        let inserted = index_chunks(&store, &UnitEmbedder, &batch).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.entries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_store_is_treated_as_empty() {
        let store = MemoryStore {
            fail_list_ids: true,
            ..Default::default()
        };
        let batch = chunks("doc.txt", &["alpha chunk"]);

        let inserted = index_chunks(&store, &UnitEmbedder, &batch).await.unwrap();
        assert_eq!(inserted, 1);
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(anyhow!("embedding backend down"))
        }
    }

    #[tokio::test]
    async fn embedding_failure_is_fatal() {
        let store = MemoryStore::default();
        let batch = chunks("doc.txt", &["alpha chunk"]);

        assert!(index_chunks(&store, &FailingEmbedder, &batch)
            .await
            .is_err());
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_inserts_nothing() {
        let store = MemoryStore::default();
        let inserted = index_chunks(&store, &UnitEmbedder, &[]).await.unwrap();
        assert_eq!(inserted, 0);
    }
}
