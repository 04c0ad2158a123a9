//! Vector store seam and the SQLite-backed implementation.
//!
//! The store is the sole persistent state: one `index_entries` table keyed
//! by chunk identity, carrying the chunk text, its embedding as an f32 BLOB,
//! and enough metadata (`source`, `page`) to reconstruct per-document
//! grouping without a separate catalog.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::path::Path;

use crate::db;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::migrate;
use crate::models::{IndexEntry, ScoredEntry, StoredEntry};

/// External vector-store capability: upsert by id, similarity query,
/// full listing, and delete-by-source.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a single entry. Atomic per entry; last-writer-wins
    /// on identity conflicts (identities are content-derived, so a conflict
    /// implies identical content).
    async fn upsert(&self, entry: &IndexEntry) -> Result<()>;

    /// The `top_k` nearest entries by cosine similarity, best-match-first.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredEntry>>;

    /// All entry identities currently in the store.
    async fn list_ids(&self) -> Result<HashSet<String>>;

    /// All entries without their vectors, for document listing.
    async fn list_all(&self) -> Result<Vec<StoredEntry>>;

    /// Delete every entry whose source matches. Returns the number removed.
    async fn delete_source(&self, source: &str) -> Result<u64>;
}

/// SQLite-backed store holding the process-wide connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the store at `path` and ensure the schema
    /// exists. The handle lives for the process lifetime.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert(&self, entry: &IndexEntry) -> Result<()> {
        let blob = vec_to_blob(&entry.embedding);
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO index_entries (id, source, page, text, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                source = excluded.source,
                page = excluded.page,
                text = excluded.text,
                embedding = excluded.embedding
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.source)
        .bind(entry.page)
        .bind(&entry.text)
        .bind(&blob)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredEntry>> {
        let rows = sqlx::query("SELECT id, source, page, text, embedding FROM index_entries")
            .fetch_all(&self.pool)
            .await?;

        let mut scored: Vec<ScoredEntry> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                ScoredEntry {
                    entry: StoredEntry {
                        id: row.get("id"),
                        source: row.get("source"),
                        page: row.get("page"),
                        text: row.get("text"),
                    },
                    score: cosine_similarity(embedding, &vec),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn list_ids(&self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM index_entries")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn list_all(&self) -> Result<Vec<StoredEntry>> {
        let rows =
            sqlx::query("SELECT id, source, page, text FROM index_entries ORDER BY rowid ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|row| StoredEntry {
                id: row.get("id"),
                source: row.get("source"),
                page: row.get("page"),
                text: row.get("text"),
            })
            .collect())
    }

    async fn delete_source(&self, source: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM index_entries WHERE source = ?")
            .bind(source)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, SqliteStore) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(&tmp.path().join("test.sqlite"))
            .await
            .unwrap();
        (tmp, store)
    }

    fn entry(id: &str, source: &str, text: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            source: source.to_string(),
            page: None,
            text: text.to_string(),
            embedding,
        }
    }

    #[tokio::test]
    async fn upsert_and_query_orders_by_similarity() {
        let (_tmp, store) = temp_store().await;

        store
            .upsert(&entry("a", "doc.txt", "about cats", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&entry("b", "doc.txt", "about dogs", vec![0.0, 1.0]))
            .await
            .unwrap();
        store
            .upsert(&entry("c", "doc.txt", "cats and dogs", vec![0.7, 0.7]))
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.id, "a");
        assert_eq!(hits[1].entry.id, "c");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn query_on_empty_store_returns_nothing() {
        let (_tmp, store) = temp_store().await;
        let hits = store.query(&[1.0, 0.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn upsert_same_id_does_not_duplicate() {
        let (_tmp, store) = temp_store().await;

        let e = entry("a", "doc.txt", "text", vec![1.0, 0.0]);
        store.upsert(&e).await.unwrap();
        store.upsert(&e).await.unwrap();

        let ids = store.list_ids().await.unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("a"));
    }

    #[tokio::test]
    async fn delete_source_removes_only_matching_entries() {
        let (_tmp, store) = temp_store().await;

        store
            .upsert(&entry("a", "one.txt", "x", vec![1.0]))
            .await
            .unwrap();
        store
            .upsert(&entry("b", "one.txt", "y", vec![1.0]))
            .await
            .unwrap();
        store
            .upsert(&entry("c", "two.txt", "z", vec![1.0]))
            .await
            .unwrap();

        let removed = store.delete_source("one.txt").await.unwrap();
        assert_eq!(removed, 2);

        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source, "two.txt");

        let removed = store.delete_source("missing.txt").await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.sqlite");

        let store = SqliteStore::open(&path).await.unwrap();
        store
            .upsert(&entry("a", "doc.txt", "text", vec![1.0]))
            .await
            .unwrap();
        drop(store);

        // Reopening must keep prior entries and not fail on existing schema.
        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(store.list_ids().await.unwrap().len(), 1);
    }
}
