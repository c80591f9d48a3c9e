use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            sort: default_sort(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}
fn default_user_agent() -> String {
    "wordmine/0.3 (post frequency miner)".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_batch_size() -> u32 {
    100
}
fn default_sort() -> String {
    "new".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

fn default_interval_minutes() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_min_word_length")]
    pub min_word_length: usize,
    #[serde(default = "default_context_length")]
    pub context_length: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,
    /// Stop words merged with the built-in set.
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_word_length: default_min_word_length(),
            context_length: default_context_length(),
            top_n: default_top_n(),
            watermark_path: default_watermark_path(),
            extra_stop_words: Vec::new(),
        }
    }
}

fn default_min_word_length() -> usize {
    3
}
fn default_context_length() -> usize {
    50
}
fn default_top_n() -> usize {
    50
}
fn default_watermark_path() -> PathBuf {
    PathBuf::from("./data/analyzed/last_analysis_timestamp.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./data/analyzed")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.api.batch_size == 0 {
        anyhow::bail!("api.batch_size must be > 0");
    }

    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    if config.scrape.interval_minutes == 0 {
        anyhow::bail!("scrape.interval_minutes must be >= 1");
    }

    if config.analysis.min_word_length == 0 {
        anyhow::bail!("analysis.min_word_length must be >= 1");
    }

    if config.analysis.context_length == 0 {
        anyhow::bail!("analysis.context_length must be >= 1");
    }

    Ok(config)
}
