//! Batch analyzer: full (non-incremental) recomputation of the word
//! index from a snapshot of stored posts.
//!
//! Every run rebuilds the in-memory index from scratch; the only state
//! carried between runs is the watermark file. A crash mid-run leaves
//! the previous watermark and aggregate values intact, so reruns are
//! always safe. Phases run strictly in order: load, filter, aggregate,
//! persist.

use anyhow::Result;
use regex::RegexBuilder;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::config::{AnalysisConfig, Config};
use crate::db;
use crate::export;
use crate::freq::FreqStore;
use crate::models::{Post, WordDetails, WordRecord};
use crate::store::PostStore;
use crate::text::TextProcessor;
use crate::watermark;

/// Per-run accumulator. Owned by the [`Analyzer`] for one run's
/// lifetime; never shared across runs.
#[derive(Default)]
pub struct WordIndex {
    /// word -> total frequency across all retained posts
    pub frequencies: HashMap<String, i64>,
    /// word -> context snippets, one per contributing text field
    pub contexts: HashMap<String, Vec<String>>,
    /// word -> ids of contributing posts
    pub post_ids: HashMap<String, HashSet<String>>,
    /// source -> (word -> frequency), for per-source persistence
    pub per_source: HashMap<String, HashMap<String, i64>>,
}

pub struct Analyzer {
    text: TextProcessor,
    index: WordIndex,
    posts_analyzed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub incremental: bool,
    pub source: Option<String>,
    /// When false, the run builds the index without touching the
    /// watermark or the aggregate table (read-only queries).
    pub persist: bool,
}

impl Analyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            text: TextProcessor::new(config)?,
            index: WordIndex::default(),
            posts_analyzed: 0,
        })
    }

    /// Accumulate one post's title (and body, for self posts) into the
    /// index.
    fn process_post(&mut self, post: &Post) {
        let mut fields: Vec<&str> = vec![&post.title];
        if post.is_self {
            if let Some(body) = &post.selftext {
                fields.push(body);
            }
        }

        for field in fields {
            for (word, count) in self.text.word_frequencies(field) {
                *self.index.frequencies.entry(word.clone()).or_insert(0) += count;

                let context = self.text.context(field, &word);
                if !context.is_empty() {
                    self.index
                        .contexts
                        .entry(word.clone())
                        .or_default()
                        .push(context);
                }

                self.index
                    .post_ids
                    .entry(word.clone())
                    .or_default()
                    .insert(post.id.clone());

                *self
                    .index
                    .per_source
                    .entry(post.source.clone())
                    .or_default()
                    .entry(word)
                    .or_insert(0) += count;
            }
        }

        self.posts_analyzed += 1;
    }

    pub fn posts_analyzed(&self) -> usize {
        self.posts_analyzed
    }

    pub fn unique_words(&self) -> usize {
        self.index.frequencies.len()
    }

    pub fn total_occurrences(&self) -> i64 {
        self.index.frequencies.values().sum()
    }

    pub fn index(&self) -> &WordIndex {
        &self.index
    }

    /// Frequency, contexts, and contributing posts for one word, or
    /// `None` if it never occurred.
    pub fn word_details(&self, word: &str) -> Option<WordDetails> {
        let frequency = *self.index.frequencies.get(word)?;
        let contexts = self.index.contexts.get(word).cloned().unwrap_or_default();
        let mut sources: Vec<String> = self
            .index
            .post_ids
            .get(word)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        sources.sort();

        Some(WordDetails {
            word: word.to_string(),
            frequency,
            contexts,
            sources_count: sources.len(),
            sources,
        })
    }

    /// All words matching a case-insensitive regular expression, ranked
    /// by descending frequency. An invalid pattern is logged and yields
    /// an empty result rather than an error.
    pub fn search(&self, pattern: &str) -> Vec<(String, i64)> {
        let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                warn!("invalid search pattern {:?}: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut matches: Vec<(String, i64)> = self
            .index
            .frequencies
            .iter()
            .filter(|(word, _)| regex.is_match(word))
            .map(|(word, freq)| (word.clone(), *freq))
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches
    }

    /// Export records, most frequent first.
    pub fn records(&self) -> Vec<WordRecord> {
        let mut words: Vec<(&String, &i64)> = self.index.frequencies.iter().collect();
        words.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        words
            .into_iter()
            .map(|(word, &frequency)| {
                let contexts = self.index.contexts.get(word);
                let sources_count = self
                    .index
                    .post_ids
                    .get(word)
                    .map(|ids| ids.len())
                    .unwrap_or(0);
                WordRecord {
                    word: word.clone(),
                    frequency,
                    contexts_count: contexts.map(|c| c.len()).unwrap_or(0),
                    sources_count,
                    sample_contexts: contexts
                        .map(|c| c.iter().take(3).cloned().collect())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }
}

/// Run one analysis pass and return the built index for querying.
pub async fn run_analysis(
    pool: &SqlitePool,
    config: &AnalysisConfig,
    opts: &AnalysisOptions,
) -> Result<Analyzer> {
    let store = PostStore::new(pool.clone());
    let freq = FreqStore::new(pool.clone());
    let mut analyzer = Analyzer::new(config)?;

    // Load
    let mut posts = store
        .fetch_for_analysis(None, opts.source.as_deref())
        .await?;
    info!(loaded = posts.len(), "analysis: loaded posts");

    // Filter: dedup by id keeping the first occurrence, then apply the
    // watermark in incremental mode. No watermark means a full first run.
    let mut seen: HashSet<String> = HashSet::new();
    posts.retain(|post| seen.insert(post.id.clone()));

    if opts.incremental {
        match watermark::read(&config.watermark_path) {
            Some(last_ts) => {
                posts.retain(|post| post.ingested_at > last_ts);
                info!(
                    retained = posts.len(),
                    watermark = last_ts,
                    "analysis: incremental filter applied"
                );
            }
            None => info!("analysis: no previous watermark, analyzing all posts"),
        }
    }

    // Aggregate
    for post in &posts {
        analyzer.process_post(post);
    }
    info!(
        posts = analyzer.posts_analyzed(),
        unique_words = analyzer.unique_words(),
        "analysis: aggregation complete"
    );

    // Persist: advance the watermark whenever at least one retained
    // post existed (even if it produced zero words), then overwrite
    // each observed source's aggregate rows with that source's own
    // word subset.
    if opts.persist {
        if let Some(max_ts) = posts
            .iter()
            .map(|p| p.ingested_at)
            .fold(None, |acc: Option<f64>, ts| {
                Some(acc.map_or(ts, |a| a.max(ts)))
            })
        {
            watermark::write(&config.watermark_path, max_ts)?;
        }

        for (source, counts) in &analyzer.index.per_source {
            freq.overwrite(source, counts).await?;
        }
        info!(
            sources = analyzer.index.per_source.len(),
            "analysis: aggregates persisted"
        );
    }

    Ok(analyzer)
}

/// CLI entry point for `analyze`: run, persist, export, report.
pub async fn run_analyze(
    config: &Config,
    incremental: bool,
    source: Option<String>,
    top_n: Option<usize>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let opts = AnalysisOptions {
        incremental,
        source,
        persist: true,
    };
    let analyzer = run_analysis(&pool, &config.analysis, &opts).await?;

    if analyzer.posts_analyzed() == 0 {
        println!("No posts to analyze.");
        pool.close().await;
        return Ok(());
    }

    let records = analyzer.records();
    let top_n = top_n.unwrap_or(config.analysis.top_n);
    let paths = export::write_analysis(&config.export.dir, &records, top_n)?;

    println!("analyze");
    println!("  posts analyzed: {}", analyzer.posts_analyzed());
    println!("  unique words: {}", analyzer.unique_words());
    println!("  total occurrences: {}", analyzer.total_occurrences());
    println!("  exported: {}", paths.json.display());
    println!("  exported: {}", paths.csv.display());
    println!("  report: {}", paths.report.display());
    println!();
    println!("  top 10 words:");
    for (i, record) in records.iter().take(10).enumerate() {
        println!(
            "  {:2}. {:<20} {:>6} times (in {} posts)",
            i + 1,
            record.word,
            record.frequency,
            record.sources_count
        );
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// CLI entry point for `search`: read-only query over a fresh index.
pub async fn run_search(config: &Config, pattern: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let opts = AnalysisOptions {
        persist: false,
        ..Default::default()
    };
    let analyzer = run_analysis(&pool, &config.analysis, &opts).await?;
    pool.close().await;

    let matches = analyzer.search(pattern);
    if matches.is_empty() {
        println!("No words matching {:?}.", pattern);
        return Ok(());
    }

    println!("{} matching word(s):", matches.len());
    for (word, count) in matches.iter().take(20) {
        println!("  {:<20} {:>6} times", word, count);
    }
    Ok(())
}

/// CLI entry point for `details`: read-only lookup of one word.
pub async fn run_details(config: &Config, word: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let opts = AnalysisOptions {
        persist: false,
        ..Default::default()
    };
    let analyzer = run_analysis(&pool, &config.analysis, &opts).await?;
    pool.close().await;

    let word = word.to_lowercase();
    match analyzer.word_details(&word) {
        Some(details) => {
            println!("word:      {}", details.word);
            println!("frequency: {} times", details.frequency);
            println!("posts:     {}", details.sources_count);
            println!("contexts:");
            for (i, context) in details.contexts.iter().take(5).enumerate() {
                println!("  {}. {}", i + 1, context);
            }
        }
        None => println!("Word {:?} not found in the data.", word),
    }
    Ok(())
}
