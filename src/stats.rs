//! Database statistics overview and the `top` query.
//!
//! Gives a quick summary of what's stored: post and session counts,
//! per-source breakdowns, the post time range, and the aggregate's top
//! words. Used to confirm that scraping and analysis are keeping up.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::freq::FreqStore;
use crate::store::PostStore;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = PostStore::new(pool.clone());
    let freq = FreqStore::new(pool.clone());

    let stats = store.stats().await?;
    let word_count = freq.word_count().await?;
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("wordmine — Database Stats");
    println!("=========================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  Size:      {}", format_bytes(db_size));
    println!();
    println!("  Posts:     {}", stats.total_posts);
    println!("  Sessions:  {}", stats.total_sessions);
    println!("  Words:     {}", word_count);

    if !stats.posts_by_source.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<24} {:>6}   {}", "SOURCE", "POSTS", "SESSIONS");
        println!("  {}", "-".repeat(48));
        for (source, count) in &stats.posts_by_source {
            let sessions = store.session_count(source).await?;
            println!("  {:<24} {:>6}   {}", source, count, sessions);
        }
    }

    if let (Some(oldest), Some(newest)) = (stats.oldest_post, stats.newest_post) {
        println!();
        println!("  Oldest post: {}", format_ts(oldest));
        println!("  Newest post: {}", format_ts(newest));
    }

    println!();
    pool.close().await;
    Ok(())
}

/// CLI entry point for `top`: rank words from the durable aggregate.
pub async fn run_top(config: &Config, n: i64, source: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;
    let freq = FreqStore::new(pool.clone());

    let top = freq.top(n, source.as_deref()).await?;
    if top.is_empty() {
        println!("No word frequencies recorded yet.");
        pool.close().await;
        return Ok(());
    }

    match &source {
        Some(src) => println!("top {} words for {}:", top.len(), src),
        None => println!("top {} words across all sources:", top.len()),
    }
    for (i, (word, count)) in top.iter().enumerate() {
        println!("{:2}. {:<20} {:>6}", i + 1, word, count);
    }

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_ts(epoch_secs: f64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}
