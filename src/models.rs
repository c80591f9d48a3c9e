//! Core data models used throughout wordmine.
//!
//! These types represent the posts and word records that flow through
//! the ingestion and analysis pipeline.

use serde::Serialize;

/// Normalized post stored in SQLite.
///
/// `id` is the source-assigned identifier and is immutable once stored;
/// every other field is overwritten on re-ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub score: i64,
    pub num_comments: i64,
    /// Creation time on the source's clock (epoch seconds).
    pub created_utc: f64,
    /// Wall-clock time of the fetch that first saw or last updated this post.
    pub ingested_at: f64,
    pub source: String,
    pub is_self: bool,
    pub is_video: bool,
    pub over_18: bool,
    pub stickied: bool,
    pub selftext: Option<String>,
    pub url: Option<String>,
}

/// Exported word-frequency record (JSON and CSV schema).
#[derive(Debug, Clone, Serialize)]
pub struct WordRecord {
    pub word: String,
    pub frequency: i64,
    pub contexts_count: usize,
    pub sources_count: usize,
    /// Up to three sample context snippets.
    pub sample_contexts: Vec<String>,
}

/// Detailed view of a single word in the analyzer's in-memory index.
#[derive(Debug, Clone, Serialize)]
pub struct WordDetails {
    pub word: String,
    pub frequency: i64,
    pub contexts: Vec<String>,
    pub sources_count: usize,
    pub sources: Vec<String>,
}
