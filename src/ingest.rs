//! Ingestion pipeline orchestration.
//!
//! Per run and per source: read the high-water mark, fetch one bounded
//! batch, keep only unseen posts, upsert them in one transaction, feed
//! their words into the frequency aggregate with a single increment,
//! and append a session record — written even when the fetch fails.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::export;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::freq::FreqStore;
use crate::models::Post;
use crate::store::PostStore;
use crate::text::TextProcessor;

/// Result of one scrape pass over one source.
pub struct ScrapeOutcome {
    pub fetched: usize,
    pub new_posts: Vec<Post>,
    /// Items dropped for lacking a stable identifier.
    pub rejected: usize,
    pub fetch_failed: bool,
}

/// One scrape pass for one source. Fetch failures are recovered here
/// (zero-count session, empty outcome); storage failures propagate.
pub async fn scrape_source(
    pool: &SqlitePool,
    fetcher: &dyn Fetcher,
    text: &TextProcessor,
    source: &str,
    batch_size: u32,
    sort: &str,
) -> Result<ScrapeOutcome> {
    let session_start = Utc::now().to_rfc3339();
    let store = PostStore::new(pool.clone());
    let freq = FreqStore::new(pool.clone());

    let high_water_mark = store.latest_timestamp(source).await?;
    match high_water_mark {
        Some(ts) => info!(source, high_water_mark = ts, "starting scrape"),
        None => info!(source, "starting scrape, no prior history"),
    }

    let batch = match fetcher.fetch(source, batch_size, sort).await {
        Ok(batch) => batch,
        Err(e) => {
            warn!(source, "fetch failed: {}", e);
            store
                .record_session(&session_start, &Utc::now().to_rfc3339(), 0, source)
                .await?;
            return Ok(ScrapeOutcome {
                fetched: 0,
                new_posts: Vec::new(),
                rejected: 0,
                fetch_failed: true,
            });
        }
    };

    let fetched = batch.len();
    let ingested_at = Utc::now().timestamp_millis() as f64 / 1000.0;

    // Classify and dedup within the batch: an id seen twice keeps the
    // later occurrence, matching upsert semantics.
    let mut new_posts: Vec<Post> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut rejected = 0usize;

    for raw in batch {
        let post = match raw.normalize(source, ingested_at) {
            Some(post) => post,
            None => {
                warn!(source, "dropping item without a stable identifier");
                rejected += 1;
                continue;
            }
        };

        if let Some(&idx) = seen.get(&post.id) {
            new_posts[idx] = post;
            continue;
        }

        // New iff unseen in the store AND strictly newer than the
        // high-water mark. The existence check catches regressed
        // creation times; the timestamp check keeps purged posts from
        // being re-added while still inside the fetch window.
        if store.exists(&post.id).await? {
            continue;
        }
        if let Some(hwm) = high_water_mark {
            if post.created_utc <= hwm {
                continue;
            }
        }

        seen.insert(post.id.clone(), new_posts.len());
        new_posts.push(post);
    }

    // Per-run word counts across all new posts: title, plus body text
    // for self posts.
    let mut wordcounts: HashMap<String, i64> = HashMap::new();
    for post in &new_posts {
        for (word, count) in text.word_frequencies(&post.title) {
            *wordcounts.entry(word).or_insert(0) += count;
        }
        if post.is_self {
            if let Some(body) = &post.selftext {
                for (word, count) in text.word_frequencies(body) {
                    *wordcounts.entry(word).or_insert(0) += count;
                }
            }
        }
    }

    store.upsert_batch(&new_posts).await?;
    if !wordcounts.is_empty() {
        freq.increment(source, &wordcounts).await?;
    }
    store.register_source(source).await?;
    store
        .record_session(
            &session_start,
            &Utc::now().to_rfc3339(),
            new_posts.len() as i64,
            source,
        )
        .await?;

    info!(
        source,
        fetched,
        new = new_posts.len(),
        rejected,
        "scrape pass complete"
    );

    Ok(ScrapeOutcome {
        fetched,
        new_posts,
        rejected,
        fetch_failed: false,
    })
}

/// CLI entry point: run one pass per configured source, either once or
/// on a blocking interval loop until Ctrl-C.
pub async fn run_scrape(
    config: &Config,
    source: Option<String>,
    once: bool,
    interval_minutes: Option<u64>,
    limit: Option<u32>,
) -> Result<()> {
    let sources: Vec<String> = match source {
        Some(src) => vec![src],
        None => config.scrape.sources.clone(),
    };
    if sources.is_empty() {
        anyhow::bail!("No source given. Pass one as an argument or set [scrape] sources.");
    }

    // CLI overrides get the same range checks as the config file.
    let batch_size = limit.unwrap_or(config.api.batch_size);
    if batch_size == 0 {
        anyhow::bail!("--limit must be > 0");
    }
    let interval_minutes = interval_minutes.unwrap_or(config.scrape.interval_minutes);
    if interval_minutes == 0 {
        anyhow::bail!("--interval must be >= 1 minute");
    }

    let pool = db::connect(config).await?;
    let fetcher = HttpFetcher::new(&config.api)?;
    let text = TextProcessor::new(&config.analysis)?;
    let interval = Duration::from_secs(interval_minutes * 60);

    loop {
        for src in &sources {
            match scrape_source(&pool, &fetcher, &text, src, batch_size, &config.api.sort).await {
                Ok(outcome) => {
                    print_outcome(src, &outcome);
                    if !outcome.new_posts.is_empty() {
                        if let Err(e) =
                            export::write_scraped_batch(&config.export.dir, src, &outcome.new_posts)
                        {
                            warn!(source = src.as_str(), "could not export batch: {:#}", e);
                        }
                    }
                }
                // Storage failure: abort this source's run, keep the loop alive.
                Err(e) => error!(source = src.as_str(), "scrape aborted: {:#}", e),
            }
        }

        if once {
            break;
        }

        println!("next scrape in {} min(s), Ctrl-C to stop", interval.as_secs() / 60);
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("scraper stopped");
                println!("stopped");
                break;
            }
        }
    }

    pool.close().await;
    Ok(())
}

fn print_outcome(source: &str, outcome: &ScrapeOutcome) {
    println!("scrape {}", source);
    if outcome.fetch_failed {
        println!("  fetch failed, session recorded with 0 new posts");
        return;
    }
    println!("  fetched: {} items", outcome.fetched);
    println!("  new posts: {}", outcome.new_posts.len());
    if outcome.rejected > 0 {
        println!("  rejected (no id): {}", outcome.rejected);
    }
    for post in outcome.new_posts.iter().take(3) {
        let title: String = post.title.chars().take(70).collect();
        println!("    {} ({})", title, post.id);
    }
    println!("ok");
}
