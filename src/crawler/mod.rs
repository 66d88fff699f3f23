//! Crawler module for catalog fetching and processing
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with redirect tracking
//! - Detail page parsing
//! - The per-book pipeline with bounded retries
//! - Sequential iteration over an id range

mod book_fetcher;
mod fetcher;
mod parser;
mod runner;

pub use book_fetcher::{BookFetcher, CatalogUrls, FetchOutcome, RetryPolicy};
pub use fetcher::{
    build_http_client, check_redirect, HttpFetcher, HttpResponse, RedirectHop, ReqwestFetcher,
};
pub use parser::{parse_detail_page, BookRecord, HEADER_SEPARATOR};
pub use runner::RangeRunner;

use crate::config::Config;
use crate::output::RunSummary;

/// Runs a complete scrape over `[start_id, end_id)`
///
/// This is the main entry point. It will:
/// 1. Build the HTTP client and catalog URLs from `config`
/// 2. Fetch, parse and store each book in turn
/// 3. Report progress on stdout
///
/// # Returns
///
/// * `Ok(RunSummary)` - The range was processed
/// * `Err(TululuError::RetriesExhausted)` - A book ran out of retries under
///   the abort policy
pub async fn scrape_range(
    config: &Config,
    start_id: u32,
    end_id: u32,
) -> crate::Result<RunSummary> {
    let fetcher = BookFetcher::from_config(config)?;
    let mut runner = RangeRunner::new(fetcher, config.run.on_exhausted);
    runner.run(start_id, end_id).await
}
