//! End-to-end tests driving the compiled `wordmine` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn wordmine_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wordmine");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/wordmine.sqlite"

[scrape]
sources = ["rust"]
interval_minutes = 60

[analysis]
min_word_length = 3
context_length = 50
watermark_path = "{root}/data/analyzed/last_analysis_timestamp.txt"

[export]
dir = "{root}/data/analyzed"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("wordmine.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_wordmine(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wordmine_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wordmine binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_wordmine(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/wordmine.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_wordmine(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_wordmine(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_stats_on_empty_database() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (stdout, stderr, success) = run_wordmine(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Posts:     0"));
    assert!(stdout.contains("Sessions:  0"));
}

#[test]
fn test_analyze_with_no_posts() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (stdout, stderr, success) = run_wordmine(&config_path, &["analyze"]);
    assert!(success, "analyze failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No posts to analyze"));
}

#[test]
fn test_top_with_empty_aggregate() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (stdout, _, success) = run_wordmine(&config_path, &["top", "-n", "5"]);
    assert!(success);
    assert!(stdout.contains("No word frequencies recorded yet"));
}

#[test]
fn test_search_with_no_data() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (stdout, _, success) = run_wordmine(&config_path, &["search", "anything"]);
    assert!(success);
    assert!(stdout.contains("No words matching"));
}

#[test]
fn test_clean_with_yes_flag() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (stdout, stderr, success) = run_wordmine(&config_path, &["clean", "--yes"]);
    assert!(success, "clean failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Removed 0 post(s)"));
}

#[test]
fn test_reset_with_yes_flag() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (stdout, stderr, success) = run_wordmine(&config_path, &["reset", "--yes"]);
    assert!(success, "reset failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Database reset"));
}

#[test]
fn test_scrape_rejects_zero_interval() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (_, stderr, success) =
        run_wordmine(&config_path, &["scrape", "--once", "--interval", "0"]);
    assert!(!success);
    assert!(stderr.contains("--interval must be >= 1"));
}

#[test]
fn test_scrape_rejects_zero_limit() {
    let (_tmp, config_path) = setup_test_env();

    run_wordmine(&config_path, &["init"]);
    let (_, stderr, success) = run_wordmine(&config_path, &["scrape", "--once", "--limit", "0"]);
    assert!(!success);
    assert!(stderr.contains("--limit must be > 0"));
}

#[test]
fn test_missing_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_wordmine(&missing, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
