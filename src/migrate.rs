use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Posts table — one row per item, keyed by the source-assigned id
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            post_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT,
            score INTEGER NOT NULL DEFAULT 0,
            num_comments INTEGER NOT NULL DEFAULT 0,
            created_utc REAL NOT NULL,
            ingested_at REAL NOT NULL,
            source TEXT NOT NULL,
            is_self INTEGER NOT NULL DEFAULT 0,
            is_video INTEGER NOT NULL DEFAULT 0,
            over_18 INTEGER NOT NULL DEFAULT 0,
            stickied INTEGER NOT NULL DEFAULT 0,
            selftext TEXT,
            url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Session audit log — append-only
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_start TEXT NOT NULL,
            session_end TEXT NOT NULL,
            new_posts INTEGER NOT NULL,
            source TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Cumulative (word, source) frequency aggregate
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS word_frequencies (
            word TEXT NOT NULL,
            source TEXT NOT NULL,
            frequency INTEGER NOT NULL,
            PRIMARY KEY (word, source)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Registry of every source ever ingested
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            name TEXT PRIMARY KEY,
            first_ingested_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_source ON posts(source)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created_utc ON posts(created_utc DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_ingested_at ON posts(ingested_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Drop every table and recreate the empty schema.
pub async fn reset_schema(pool: &SqlitePool) -> Result<()> {
    for table in ["posts", "sessions", "word_frequencies", "sources"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    apply_schema(pool).await
}
