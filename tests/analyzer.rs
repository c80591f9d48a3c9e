//! Batch analyzer tests: incremental watermark boundary, per-source
//! persistence, and index queries.

use sqlx::SqlitePool;
use tempfile::TempDir;

use wordmine::analyze::{run_analysis, AnalysisOptions};
use wordmine::config::AnalysisConfig;
use wordmine::db;
use wordmine::freq::FreqStore;
use wordmine::migrate;
use wordmine::models::Post;
use wordmine::store::PostStore;
use wordmine::watermark;

fn post(
    id: &str,
    title: &str,
    source: &str,
    created_utc: f64,
    ingested_at: f64,
) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        author: Some("tester".to_string()),
        score: 1,
        num_comments: 0,
        created_utc,
        ingested_at,
        source: source.to_string(),
        is_self: false,
        is_video: false,
        over_18: false,
        stickied: false,
        selftext: None,
        url: None,
    }
}

async fn setup() -> SqlitePool {
    let pool = db::connect_memory().await.unwrap();
    migrate::apply_schema(&pool).await.unwrap();
    pool
}

fn analysis_config(tmp: &TempDir) -> AnalysisConfig {
    AnalysisConfig {
        watermark_path: tmp.path().join("last_analysis_timestamp.txt"),
        ..Default::default()
    }
}

fn persisting() -> AnalysisOptions {
    AnalysisOptions {
        persist: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn incremental_pass_respects_watermark_boundary() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "older words", "chan", 10.0, 10.0)).await.unwrap();
    store.upsert(&post("b", "boundary words", "chan", 20.0, 20.0)).await.unwrap();
    store.upsert(&post("c", "newest words", "chan", 30.0, 30.0)).await.unwrap();

    watermark::write(&cfg.watermark_path, 20.0).unwrap();

    let opts = AnalysisOptions {
        incremental: true,
        persist: true,
        ..Default::default()
    };
    let analyzer = run_analysis(&pool, &cfg, &opts).await.unwrap();

    // Strictly-greater filter: only the t=30 post survives
    assert_eq!(analyzer.posts_analyzed(), 1);
    assert!(analyzer.word_details("newest").is_some());
    assert!(analyzer.word_details("older").is_none());
    assert!(analyzer.word_details("boundary").is_none());

    // Watermark advanced to the max observed ingestion timestamp
    assert_eq!(watermark::read(&cfg.watermark_path), Some(30.0));
}

#[tokio::test]
async fn first_incremental_run_processes_everything() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "older words", "chan", 10.0, 10.0)).await.unwrap();
    store.upsert(&post("c", "newest words", "chan", 30.0, 30.0)).await.unwrap();

    let opts = AnalysisOptions {
        incremental: true,
        persist: true,
        ..Default::default()
    };
    let analyzer = run_analysis(&pool, &cfg, &opts).await.unwrap();

    assert_eq!(analyzer.posts_analyzed(), 2);
    assert_eq!(watermark::read(&cfg.watermark_path), Some(30.0));
}

#[tokio::test]
async fn watermark_advances_even_when_no_words_result() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    // Title is entirely stop words, so zero words come out
    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "the and for", "chan", 40.0, 40.0)).await.unwrap();

    let analyzer = run_analysis(&pool, &cfg, &persisting()).await.unwrap();
    assert_eq!(analyzer.unique_words(), 0);
    assert_eq!(watermark::read(&cfg.watermark_path), Some(40.0));
}

#[tokio::test]
async fn overwrite_is_split_per_source() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "ferris crab", "alpha", 1.0, 1.0)).await.unwrap();
    store.upsert(&post("b", "python snake", "beta", 2.0, 2.0)).await.unwrap();

    run_analysis(&pool, &cfg, &persisting()).await.unwrap();

    let freq = FreqStore::new(pool.clone());
    let alpha: Vec<String> = freq
        .top(10, Some("alpha"))
        .await
        .unwrap()
        .into_iter()
        .map(|(w, _)| w)
        .collect();
    assert!(alpha.contains(&"ferris".to_string()));
    assert!(alpha.contains(&"crab".to_string()));
    assert!(!alpha.contains(&"python".to_string()), "alpha must not carry beta's words");

    let beta: Vec<String> = freq
        .top(10, Some("beta"))
        .await
        .unwrap()
        .into_iter()
        .map(|(w, _)| w)
        .collect();
    assert!(beta.contains(&"python".to_string()));
    assert!(!beta.contains(&"ferris".to_string()));

    assert_eq!(
        freq.distinct_sources().await.unwrap(),
        vec!["alpha".to_string(), "beta".to_string()]
    );
}

#[tokio::test]
async fn overwrite_leaves_stale_rows_intact() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let freq = FreqStore::new(pool.clone());
    let legacy = std::collections::HashMap::from([("legacy".to_string(), 5_i64)]);
    freq.increment("alpha", &legacy).await.unwrap();

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "ferris crab", "alpha", 1.0, 1.0)).await.unwrap();
    run_analysis(&pool, &cfg, &persisting()).await.unwrap();

    let words = freq.top(10, Some("alpha")).await.unwrap();
    assert!(words.contains(&("legacy".to_string(), 5)), "stale entry must persist");
    assert!(words.contains(&("ferris".to_string(), 1)));
}

#[tokio::test]
async fn top_sums_across_sources_when_unscoped() {
    let pool = setup().await;
    let freq = FreqStore::new(pool.clone());

    let counts = std::collections::HashMap::from([("shared".to_string(), 2_i64)]);
    freq.increment("alpha", &counts).await.unwrap();
    freq.increment("beta", &counts).await.unwrap();

    let top = freq.top(10, None).await.unwrap();
    assert_eq!(top[0], ("shared".to_string(), 4));
}

#[tokio::test]
async fn search_ranks_by_descending_frequency() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "rust rust rusty", "chan", 1.0, 1.0)).await.unwrap();

    let analyzer = run_analysis(&pool, &cfg, &AnalysisOptions::default()).await.unwrap();
    let matches = analyzer.search("rust");
    assert_eq!(
        matches,
        vec![("rust".to_string(), 2), ("rusty".to_string(), 1)]
    );
}

#[tokio::test]
async fn search_invalid_pattern_returns_empty() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "some words here", "chan", 1.0, 1.0)).await.unwrap();

    let analyzer = run_analysis(&pool, &cfg, &AnalysisOptions::default()).await.unwrap();
    assert!(analyzer.search("[unterminated").is_empty());
}

#[tokio::test]
async fn word_details_reports_contexts_and_contributors() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "learning tokio today", "chan", 1.0, 1.0)).await.unwrap();
    store.upsert(&post("b", "tokio runtime tips", "chan", 2.0, 2.0)).await.unwrap();

    let analyzer = run_analysis(&pool, &cfg, &AnalysisOptions::default()).await.unwrap();
    let details = analyzer.word_details("tokio").unwrap();
    assert_eq!(details.frequency, 2);
    assert_eq!(details.sources_count, 2);
    assert_eq!(details.sources, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(details.contexts.len(), 2);
    assert!(details.contexts.iter().all(|c| c.contains("tokio")));

    assert!(analyzer.word_details("absent").is_none());
}

#[tokio::test]
async fn readonly_run_persists_nothing() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "ferris crab", "alpha", 1.0, 1.0)).await.unwrap();

    let analyzer = run_analysis(&pool, &cfg, &AnalysisOptions::default()).await.unwrap();
    assert_eq!(analyzer.posts_analyzed(), 1);

    assert_eq!(watermark::read(&cfg.watermark_path), None);
    let freq = FreqStore::new(pool.clone());
    assert!(freq.top(10, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn source_scoped_analysis_ignores_other_sources() {
    let pool = setup().await;
    let tmp = TempDir::new().unwrap();
    let cfg = analysis_config(&tmp);

    let store = PostStore::new(pool.clone());
    store.upsert(&post("a", "ferris crab", "alpha", 1.0, 1.0)).await.unwrap();
    store.upsert(&post("b", "python snake", "beta", 2.0, 2.0)).await.unwrap();

    let opts = AnalysisOptions {
        source: Some("alpha".to_string()),
        ..Default::default()
    };
    let analyzer = run_analysis(&pool, &cfg, &opts).await.unwrap();
    assert_eq!(analyzer.posts_analyzed(), 1);
    assert!(analyzer.word_details("ferris").is_some());
    assert!(analyzer.word_details("python").is_none());
}
