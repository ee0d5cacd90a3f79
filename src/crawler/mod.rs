//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pages still to visit
//! - The fetch layer (trait plus HTTP implementation)
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierEntry};

use crate::config::Config;
use crate::output::{open_sink, CrawlStatistics};
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl with the HTTP fetcher and the configured sink
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Compile the selector rules and check the seeds
/// 3. Open the output sink
/// 4. Crawl until the frontier is empty or `cancel` fires
///
/// A failure in steps 1 or 2 leaves the output file untouched.
///
/// # Arguments
///
/// * `config` - A validated configuration
/// * `cancel` - Token that stops the crawl early
pub async fn crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlStatistics> {
    let fetcher = HttpFetcher::new(config)?;

    let mut coordinator =
        Coordinator::build(config, fetcher, || Ok(open_sink(&config.output)?))?
            .with_cancellation(cancel);
    coordinator.run().await
}
