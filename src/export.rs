//! File export: scraped batches and analysis results as JSON and CSV,
//! plus a plain-text analysis report. The record schema is the contract;
//! the on-disk layout (timestamped files under the export directory) is
//! a convenience for downstream tooling.

use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::models::{Post, WordRecord};

pub struct AnalysisPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub report: PathBuf,
}

/// Dump a run's new posts to timestamped JSON and CSV files under
/// `<dir>/scraped/`.
pub fn write_scraped_batch(dir: &Path, source: &str, posts: &[Post]) -> Result<(PathBuf, PathBuf)> {
    let scraped = dir.join("scraped");
    std::fs::create_dir_all(&scraped)?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let base = format!("posts_{}_{}", source, stamp);

    let json_path = scraped.join(format!("{}.json", base));
    std::fs::write(&json_path, serde_json::to_string_pretty(posts)?)?;

    let csv_path = scraped.join(format!("{}.csv", base));
    let mut csv = String::from(
        "post_id,title,author,score,num_comments,created_utc,ingested_at,source,is_self,is_video,over_18,stickied,url\n",
    );
    for post in posts {
        let fields = [
            csv_escape(&post.id),
            csv_escape(&post.title),
            csv_escape(post.author.as_deref().unwrap_or("")),
            post.score.to_string(),
            post.num_comments.to_string(),
            post.created_utc.to_string(),
            post.ingested_at.to_string(),
            csv_escape(&post.source),
            post.is_self.to_string(),
            post.is_video.to_string(),
            post.over_18.to_string(),
            post.stickied.to_string(),
            csv_escape(post.url.as_deref().unwrap_or("")),
        ];
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    std::fs::write(&csv_path, csv)?;

    Ok((json_path, csv_path))
}

/// Write word-frequency records as JSON and CSV, and a top-N text
/// report, all timestamped under the export directory.
pub fn write_analysis(dir: &Path, records: &[WordRecord], top_n: usize) -> Result<AnalysisPaths> {
    std::fs::create_dir_all(dir)?;
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");

    let json = dir.join(format!("word_frequencies_{}.json", stamp));
    std::fs::write(&json, serde_json::to_string_pretty(records)?)?;

    let csv = dir.join(format!("word_frequencies_{}.csv", stamp));
    let mut out = String::from("word,frequency,contexts_count,sources_count,sample_contexts\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_escape(&record.word),
            record.frequency,
            record.contexts_count,
            record.sources_count,
            csv_escape(&record.sample_contexts.join(" | ")),
        ));
    }
    std::fs::write(&csv, out)?;

    let report = dir.join(format!("word_analysis_report_{}.txt", stamp));
    std::fs::write(&report, render_report(records, top_n))?;

    Ok(AnalysisPaths { json, csv, report })
}

fn render_report(records: &[WordRecord], top_n: usize) -> String {
    let total_occurrences: i64 = records.iter().map(|r| r.frequency).sum();

    let mut lines = Vec::new();
    lines.push("=".repeat(60));
    lines.push("WORD FREQUENCY ANALYSIS REPORT".to_string());
    lines.push("=".repeat(60));
    lines.push(format!(
        "Generated: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("Total unique words: {}", records.len()));
    lines.push(format!("Total word occurrences: {}", total_occurrences));
    lines.push(String::new());
    lines.push("TOP WORDS BY FREQUENCY:".to_string());
    lines.push("-".repeat(40));
    for (i, record) in records.iter().take(top_n).enumerate() {
        lines.push(format!(
            "{:2}. {:<20} {:>6} times (in {} posts)",
            i + 1,
            record.word,
            record.frequency,
            record.sources_count
        ));
    }
    lines.join("\n")
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_escape_quotes_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn analysis_files_are_written() {
        let tmp = tempfile::TempDir::new().unwrap();
        let records = vec![WordRecord {
            word: "rust".to_string(),
            frequency: 3,
            contexts_count: 2,
            sources_count: 2,
            sample_contexts: vec!["learning rust".to_string()],
        }];

        let paths = write_analysis(tmp.path(), &records, 10).unwrap();
        assert!(paths.json.exists());
        assert!(paths.csv.exists());
        assert!(paths.report.exists());

        let csv = std::fs::read_to_string(&paths.csv).unwrap();
        assert!(csv.starts_with("word,frequency"));
        assert!(csv.contains("rust,3,2,2"));

        let report = std::fs::read_to_string(&paths.report).unwrap();
        assert!(report.contains("TOP WORDS BY FREQUENCY"));
        assert!(report.contains("rust"));
    }
}
