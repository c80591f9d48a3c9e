//! # wordmine CLI
//!
//! Commands for database initialization, scraping, analysis, and
//! maintenance.
//!
//! ```bash
//! wordmine --config ./config/wordmine.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wordmine init` | Create the SQLite database and run schema migrations |
//! | `wordmine scrape [SOURCE]` | Fetch new posts, once or on an interval |
//! | `wordmine analyze` | Recompute the word index and export results |
//! | `wordmine top` | Show top words from the durable aggregate |
//! | `wordmine search <PATTERN>` | Find indexed words by regex |
//! | `wordmine details <WORD>` | Inspect one word's frequency and contexts |
//! | `wordmine stats` | Database statistics |
//! | `wordmine clean` | Bulk delete with optional filters |
//! | `wordmine reset` | Drop and recreate all tables |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use wordmine::{analyze, clean, config, ingest, migrate, stats};

/// wordmine — a post scraper and incremental word-frequency mining
/// pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/wordmine.example.toml`.
#[derive(Parser)]
#[command(
    name = "wordmine",
    about = "wordmine — scrape posts and mine per-source word frequencies",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/wordmine.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (posts,
    /// sessions, word_frequencies, sources). Idempotent.
    Init,

    /// Fetch new posts from the listing API.
    ///
    /// Runs continuously on the configured interval by default; pass
    /// `--once` for a single pass. Each pass records a session, even
    /// when the fetch fails.
    Scrape {
        /// Source (channel) to scrape. Defaults to `[scrape] sources`
        /// from the config.
        source: Option<String>,

        /// Run a single pass and exit.
        #[arg(long)]
        once: bool,

        /// Override the interval between passes, in minutes.
        #[arg(long)]
        interval: Option<u64>,

        /// Override the fetch batch size.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Recompute word frequencies from stored posts and export results.
    ///
    /// A full pass by default; `--incremental` only processes posts
    /// ingested after the last analysis watermark.
    Analyze {
        /// Only analyze posts ingested since the last analysis.
        #[arg(long)]
        incremental: bool,

        /// Restrict the pass to one source.
        #[arg(long)]
        source: Option<String>,

        /// Number of top words in the report.
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Show the top words from the durable aggregate.
    Top {
        /// Number of words to show.
        #[arg(short = 'n', long, default_value_t = 10)]
        count: i64,

        /// Restrict to one source; otherwise frequencies are summed
        /// across sources.
        #[arg(long)]
        source: Option<String>,
    },

    /// Search indexed words by case-insensitive regex.
    Search {
        /// The pattern to match against words.
        pattern: String,
    },

    /// Show frequency, contexts, and contributing posts for one word.
    Details {
        word: String,
    },

    /// Database statistics.
    Stats,

    /// Delete posts, optionally filtered by source and/or age.
    ///
    /// With no filters this deletes everything; a confirmation prompt
    /// guards the operation unless `--yes` is passed.
    Clean {
        /// Only delete posts from this source.
        #[arg(long)]
        source: Option<String>,

        /// Only delete posts older than this many days.
        #[arg(long)]
        older_than_days: Option<i64>,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Drop and recreate all tables.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Scrape {
            source,
            once,
            interval,
            limit,
        } => {
            ingest::run_scrape(&cfg, source, once, interval, limit).await?;
        }
        Commands::Analyze {
            incremental,
            source,
            top_n,
        } => {
            analyze::run_analyze(&cfg, incremental, source, top_n).await?;
        }
        Commands::Top { count, source } => {
            stats::run_top(&cfg, count, source).await?;
        }
        Commands::Search { pattern } => {
            analyze::run_search(&cfg, &pattern).await?;
        }
        Commands::Details { word } => {
            analyze::run_details(&cfg, &word).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Clean {
            source,
            older_than_days,
            yes,
        } => {
            clean::run_clean(&cfg, source, older_than_days, yes).await?;
        }
        Commands::Reset { yes } => {
            clean::run_reset(&cfg, yes).await?;
        }
    }

    Ok(())
}
