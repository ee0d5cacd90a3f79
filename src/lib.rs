//! Shelfscan: a retail product crawler
//!
//! This crate walks a retail site's listing pages, follows product links and
//! pagination, extracts product records with ordered fallback selectors, and
//! normalizes the scraped price text into a numeric amount.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

#[cfg(test)]
mod testing;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-page failures never surface here; they are recorded as
/// [`state::PageOutcome`] values and counted in the crawl statistics.
#[derive(Debug, Error)]
pub enum ShelfscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector rule '{rule}': {message}")]
    InvalidSelector { rule: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Unfollowable link: {0}")]
    Unfollowable(String),
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, ShelfscanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Fetcher, HttpFetcher};
pub use extract::{extract_links, extract_product, ListingLinks, Page, RawProductRecord, SiteRules};
pub use normalize::{NormalizedProductRecord, PriceNormalizer};
pub use output::{CrawlStatistics, RecordSink};
pub use state::{PageKind, PageOutcome, PageState};
