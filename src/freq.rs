//! Cumulative (word, source) frequency aggregate over SQLite.
//!
//! Two distinct write paths with different semantics:
//! [`FreqStore::increment`] adds to existing counts (the ingestion
//! pipeline's per-batch update) and [`FreqStore::overwrite`] replaces
//! them (the batch analyzer's full recomputation). Callers pick one;
//! interleaving them for the same (word, source) is on the caller.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

pub struct FreqStore {
    pool: SqlitePool,
}

impl FreqStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add `count` to the stored frequency of each (word, source),
    /// creating missing rows. All-or-nothing: one transaction per call,
    /// so a failure never leaves a partially incremented batch.
    pub async fn increment(&self, source: &str, wordcounts: &HashMap<String, i64>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (word, count) in wordcounts {
            sqlx::query(
                r#"
                INSERT INTO word_frequencies (word, source, frequency)
                VALUES (?, ?, ?)
                ON CONFLICT(word, source) DO UPDATE SET
                    frequency = frequency + excluded.frequency
                "#,
            )
            .bind(word)
            .bind(source)
            .bind(count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Set the stored frequency of each (word, source) to the given
    /// count, creating missing rows. Words absent from the map keep
    /// their prior value (stale entries persist until a cleanup).
    pub async fn overwrite(&self, source: &str, wordcounts: &HashMap<String, i64>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (word, count) in wordcounts {
            sqlx::query(
                r#"
                INSERT INTO word_frequencies (word, source, frequency)
                VALUES (?, ?, ?)
                ON CONFLICT(word, source) DO UPDATE SET
                    frequency = excluded.frequency
                "#,
            )
            .bind(word)
            .bind(source)
            .bind(count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Top `n` words by frequency, descending. When no source is given,
    /// frequencies are summed across all sources per word before ranking.
    pub async fn top(&self, n: i64, source: Option<&str>) -> Result<Vec<(String, i64)>> {
        let rows = match source {
            Some(src) => {
                sqlx::query(
                    "SELECT word, frequency FROM word_frequencies \
                     WHERE source = ? ORDER BY frequency DESC LIMIT ?",
                )
                .bind(src)
                .bind(n)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT word, SUM(frequency) AS frequency FROM word_frequencies \
                     GROUP BY word ORDER BY frequency DESC LIMIT ?",
                )
                .bind(n)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| (row.get("word"), row.get("frequency")))
            .collect())
    }

    /// Distinct source names present in the aggregate table.
    pub async fn distinct_sources(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT source FROM word_frequencies ORDER BY source ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn word_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT word) FROM word_frequencies")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
