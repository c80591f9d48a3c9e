//! # wordmine
//!
//! A post scraper and incremental word-frequency mining pipeline.
//!
//! wordmine periodically fetches posts from a public listing API,
//! persists them to SQLite, and maintains a running per-source
//! word-frequency aggregate without reprocessing history. A separate
//! batch analyzer rebuilds a full in-memory word index (frequencies,
//! context snippets, contributing posts) on demand for reports and
//! ad-hoc queries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │   Fetcher   │──▶│   Ingestion   │──▶│     SQLite      │
//! │ listing API │   │ dedup+filter │   │ posts+aggregate │
//! └─────────────┘   └──────────────┘   └────────┬────────┘
//!                                               │
//!                                      ┌────────▼────────┐
//!                                      │  Batch Analyzer │
//!                                      │ index + exports │
//!                                      └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wordmine init                  # create database
//! wordmine scrape rust --once    # ingest one batch
//! wordmine scrape rust           # scrape on an interval
//! wordmine analyze               # full recomputation + export
//! wordmine top -n 20             # top words from the aggregate
//! wordmine search "^rust"        # regex word search
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`fetch`] | Listing API client and `Fetcher` trait |
//! | [`text`] | Text normalization and word filtering |
//! | [`store`] | Durable post store |
//! | [`freq`] | (word, source) frequency aggregate |
//! | [`ingest`] | Incremental ingestion pipeline |
//! | [`analyze`] | Batch analyzer and word index |
//! | [`export`] | JSON/CSV/report export |
//! | [`watermark`] | Last-analysis timestamp file |
//! | [`stats`] | Database statistics and top-word queries |
//! | [`clean`] | Bulk delete and full reset |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyze;
pub mod clean;
pub mod config;
pub mod db;
pub mod export;
pub mod fetch;
pub mod freq;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod stats;
pub mod store;
pub mod text;
pub mod watermark;
