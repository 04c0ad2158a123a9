use anyhow::Result;
use sqlx::SqlitePool;

/// Create the vector-index schema. Idempotent; running it repeatedly is safe.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_entries (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            page INTEGER,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_index_entries_source ON index_entries(source)")
        .execute(pool)
        .await?;

    Ok(())
}
