//! Durable post store over SQLite.
//!
//! Owns the `posts`, `sessions`, and `sources` tables. All multi-row
//! writes go through a single transaction so a failure partway rolls
//! back to the previous consistent state.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::models::Post;

pub struct PostStore {
    pool: SqlitePool,
}

/// Summary counters for the `stats` command.
#[derive(Debug, Clone)]
pub struct DbStats {
    pub total_posts: i64,
    pub total_sessions: i64,
    pub posts_by_source: Vec<(String, i64)>,
    pub oldest_post: Option<f64>,
    pub newest_post: Option<f64>,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// True iff a post with this identifier is already stored.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM posts WHERE post_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Max creation timestamp among stored posts for a source — the
    /// high-water mark used to bound re-fetching.
    pub async fn latest_timestamp(&self, source: &str) -> Result<Option<f64>> {
        let ts: Option<f64> =
            sqlx::query_scalar("SELECT MAX(created_utc) FROM posts WHERE source = ?")
                .bind(source)
                .fetch_one(&self.pool)
                .await?;
        Ok(ts)
    }

    /// Insert or overwrite a single post. Every field except the
    /// identifier is replaced on conflict.
    pub async fn upsert(&self, post: &Post) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        upsert_in_tx(&mut tx, post).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Upsert a whole batch in one transaction. Duplicate identifiers
    /// within the batch resolve to the last occurrence.
    pub async fn upsert_batch(&self, posts: &[Post]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for post in posts {
            upsert_in_tx(&mut tx, post).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Load posts newest-first for a batch analysis pass.
    pub async fn fetch_for_analysis(
        &self,
        limit: Option<i64>,
        source: Option<&str>,
    ) -> Result<Vec<Post>> {
        let mut sql = String::from(
            "SELECT post_id, title, author, score, num_comments, created_utc, ingested_at, \
             source, is_self, is_video, over_18, stickied, selftext, url FROM posts",
        );
        if source.is_some() {
            sql.push_str(" WHERE source = ?");
        }
        sql.push_str(" ORDER BY created_utc DESC");
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(src) = source {
            query = query.bind(src);
        }
        if let Some(lim) = limit {
            query = query.bind(lim);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let posts = rows
            .iter()
            .map(|row| Post {
                id: row.get("post_id"),
                title: row.get("title"),
                author: row.get("author"),
                score: row.get("score"),
                num_comments: row.get("num_comments"),
                created_utc: row.get("created_utc"),
                ingested_at: row.get("ingested_at"),
                source: row.get("source"),
                is_self: row.get("is_self"),
                is_video: row.get("is_video"),
                over_18: row.get("over_18"),
                stickied: row.get("stickied"),
                selftext: row.get("selftext"),
                url: row.get("url"),
            })
            .collect();

        Ok(posts)
    }

    /// Conditional bulk delete. Filters compose with AND; omitting both
    /// matches everything, so callers must confirm before reaching here.
    /// Matching session rows are removed in the same transaction.
    /// Returns the number of posts removed.
    pub async fn delete(
        &self,
        source: Option<&str>,
        older_than_days: Option<i64>,
    ) -> Result<u64> {
        let cutoff = older_than_days
            .map(|days| chrono::Utc::now().timestamp() as f64 - (days as f64) * 86_400.0);

        let mut conditions: Vec<&str> = Vec::new();
        if source.is_some() {
            conditions.push("source = ?");
        }
        if cutoff.is_some() {
            conditions.push("created_utc < ?");
        }
        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let mut tx = self.pool.begin().await?;

        let sql = format!("DELETE FROM posts WHERE {}", where_clause);
        let mut query = sqlx::query(&sql);
        if let Some(src) = source {
            query = query.bind(src);
        }
        if let Some(cut) = cutoff {
            query = query.bind(cut);
        }
        let removed = query.execute(&mut *tx).await?.rows_affected();

        if let Some(src) = source {
            sqlx::query("DELETE FROM sessions WHERE source = ?")
                .bind(src)
                .execute(&mut *tx)
                .await?;
        } else if older_than_days.is_none() {
            sqlx::query("DELETE FROM sessions").execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    /// Append one row to the session audit log.
    pub async fn record_session(
        &self,
        session_start: &str,
        session_end: &str,
        new_posts: i64,
        source: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (session_start, session_end, new_posts, source) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(session_start)
        .bind(session_end)
        .bind(new_posts)
        .bind(source)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a source in the registry if not already present.
    pub async fn register_source(&self, source: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO sources (name, first_ingested_at) VALUES (?, ?) \
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(source)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All sources ever ingested, sorted by name.
    pub async fn list_sources(&self) -> Result<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sources ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    pub async fn session_count(&self, source: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE source = ?")
            .bind(source)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn stats(&self) -> Result<DbStats> {
        let total_posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        let total_sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await?;

        let source_rows = sqlx::query(
            "SELECT source, COUNT(*) AS post_count FROM posts \
             GROUP BY source ORDER BY post_count DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let posts_by_source = source_rows
            .iter()
            .map(|row| (row.get("source"), row.get("post_count")))
            .collect();

        let range = sqlx::query("SELECT MIN(created_utc) AS oldest, MAX(created_utc) AS newest FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(DbStats {
            total_posts,
            total_sessions,
            posts_by_source,
            oldest_post: range.get("oldest"),
            newest_post: range.get("newest"),
        })
    }
}

async fn upsert_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    post: &Post,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO posts (post_id, title, author, score, num_comments, created_utc,
                           ingested_at, source, is_self, is_video, over_18, stickied,
                           selftext, url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(post_id) DO UPDATE SET
            title = excluded.title,
            author = excluded.author,
            score = excluded.score,
            num_comments = excluded.num_comments,
            created_utc = excluded.created_utc,
            ingested_at = excluded.ingested_at,
            source = excluded.source,
            is_self = excluded.is_self,
            is_video = excluded.is_video,
            over_18 = excluded.over_18,
            stickied = excluded.stickied,
            selftext = excluded.selftext,
            url = excluded.url
        "#,
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.author)
    .bind(post.score)
    .bind(post.num_comments)
    .bind(post.created_utc)
    .bind(post.ingested_at)
    .bind(&post.source)
    .bind(post.is_self)
    .bind(post.is_video)
    .bind(post.over_18)
    .bind(post.stickied)
    .bind(&post.selftext)
    .bind(&post.url)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
