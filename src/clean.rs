//! Destructive maintenance: bulk delete and full reset.
//!
//! Both operations prompt for confirmation unless `--yes` was passed;
//! a refusal leaves state untouched.

use anyhow::Result;
use std::io::Write;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::store::PostStore;

/// Delete posts matching the optional source and age filters (AND),
/// along with their session rows. No filters means everything.
pub async fn run_clean(
    config: &Config,
    source: Option<String>,
    older_than_days: Option<i64>,
    yes: bool,
) -> Result<()> {
    let description = match (&source, older_than_days) {
        (Some(src), Some(days)) => {
            format!("posts from {} older than {} day(s)", src, days)
        }
        (Some(src), None) => format!("ALL posts from {}", src),
        (None, Some(days)) => format!("posts older than {} day(s)", days),
        (None, None) => "ALL posts and sessions".to_string(),
    };

    if !yes && !confirm(&format!("This will delete {}. Continue?", description))? {
        println!("Cancelled, nothing deleted.");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = PostStore::new(pool.clone());
    let removed = store.delete(source.as_deref(), older_than_days).await?;
    pool.close().await;

    println!("Removed {} post(s).", removed);
    Ok(())
}

/// Drop and recreate every table. The word aggregate goes with it.
pub async fn run_reset(config: &Config, yes: bool) -> Result<()> {
    if !yes && !confirm("This will delete ALL data and recreate empty tables. Continue?")? {
        println!("Cancelled, nothing deleted.");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    migrate::reset_schema(&pool).await?;
    pool.close().await;

    println!("Database reset.");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (yes/no): ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
