//! Crawl statistics
//!
//! The coordinator keeps one [`CrawlStatistics`] per run and returns it when
//! the run ends. Every counter mirrors an event on the log channel, so the
//! same totals can be rebuilt from the logs.

use crate::state::PageState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Terminal state counts
    pub pages_by_state: HashMap<PageState, u64>,

    /// Pages the fetch layer returned successfully
    pub pages_fetched: u64,

    /// Pages the fetch layer gave up on
    pub pages_failed: u64,

    /// Listing pages whose links were extracted
    pub listing_pages: u64,

    /// Product pages run through the product extractor
    pub product_pages: u64,

    /// Records handed to the sink
    pub records_emitted: u64,

    /// Product pages without an extractable name
    pub pages_without_name: u64,

    /// Fetched pages that could not be processed
    pub extraction_errors: u64,

    /// Pages that redirected to a URL already visited this run
    pub redirect_duplicates: u64,

    /// Records emitted with price text that was not a number
    pub prices_unnormalized: u64,

    /// New frontier entries created from discovered links
    pub links_enqueued: u64,

    /// Discovered links already in the visited set
    pub duplicate_links: u64,

    /// Discovered links outside the allowed domains
    pub offsite_links: u64,

    /// Discovered links deeper than the depth limit
    pub depth_limited_links: u64,

    /// Discovered links that could not be resolved to an HTTP(S) URL
    pub unfollowable_links: u64,

    /// Whether the run stopped on cancellation
    pub cancelled: bool,
}

impl CrawlStatistics {
    pub fn record_state(&mut self, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;
    }

    pub fn count_in_state(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Pages that reached any terminal state
    pub fn pages_processed(&self) -> u64 {
        self.pages_by_state.values().sum()
    }

    /// Percentage of finished pages that completed successfully
    pub fn success_rate(&self) -> f64 {
        let total = self.pages_processed();
        if total == 0 {
            return 0.0;
        }
        let succeeded: u64 = self
            .pages_by_state
            .iter()
            .filter(|(state, _)| state.is_success())
            .map(|(_, count)| count)
            .sum();
        (succeeded as f64 / total as f64) * 100.0
    }

    /// Emits the end-of-run summary on the log channel
    pub fn log_summary(&self) {
        tracing::info!(
            records_emitted = self.records_emitted,
            pages_failed = self.pages_failed,
            prices_unnormalized = self.prices_unnormalized,
            pages_without_name = self.pages_without_name,
            extraction_errors = self.extraction_errors,
            cancelled = self.cancelled,
            "Crawl finished in {:.1?}",
            self.duration
        );
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    if let Some(started_at) = stats.started_at {
        println!("Started: {}", started_at.to_rfc3339());
    }
    println!("Duration: {:.1?}", stats.duration);
    if stats.cancelled {
        println!("Stopped early: cancelled");
    }
    println!();

    println!("Records:");
    println!("  Emitted: {}", stats.records_emitted);
    println!("  Without price: {}", stats.prices_unnormalized);
    println!("  Product pages without a name: {}", stats.pages_without_name);
    println!();

    println!("Pages:");
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Failed: {}", stats.pages_failed);
    println!("  Listing pages: {}", stats.listing_pages);
    println!("  Product pages: {}", stats.product_pages);
    println!("  Extraction errors: {}", stats.extraction_errors);
    println!("  Redirected to a visited page: {}", stats.redirect_duplicates);
    println!();

    println!("Links:");
    println!("  Enqueued: {}", stats.links_enqueued);
    println!("  Already seen: {}", stats.duplicate_links);
    println!("  Off-site: {}", stats.offsite_links);
    println!("  Beyond depth limit: {}", stats.depth_limited_links);
    println!("  Unfollowable: {}", stats.unfollowable_links);
    println!();

    println!("Pages by State:");
    let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    for (state, count) in state_counts {
        println!("  {}: {}", state, count);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} pages finished)",
        stats.success_rate(),
        stats.pages_processed()
    );
}
