//! Fetch layer
//!
//! The coordinator only sees the [`Fetcher`] trait: a URL goes in, a page body
//! or a [`FetchError`] comes out. [`HttpFetcher`] is the production
//! implementation and owns every network concern:
//! - User agent and timeouts
//! - Request spacing (`request-delay-ms`, widened by robots.txt `Crawl-delay`)
//! - robots.txt checks
//! - Retries for server errors and timeouts
//! - Content-Type filtering

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::robots::RobotsCache;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Upper bound for a robots.txt `Crawl-delay`
const MAX_CRAWL_DELAY_SECS: f64 = 60.0;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    pub status_code: u16,
    pub body: String,
}

/// Why a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status_code} for {url}")]
    Status { url: String, status_code: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },
}

impl FetchError {
    /// Server errors and timeouts may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Source of pages for the coordinator
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use shelfscan::config::{CrawlerConfig, UserAgentConfig};
/// use shelfscan::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "shelfscan".to_string(),
///     crawler_version: "0.1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&CrawlerConfig::default(), &user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(crawler.request_timeout_secs);

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP(S)
pub struct HttpFetcher {
    client: Client,
    robots: Option<RobotsCache>,
    robots_agent: String,
    request_delay: Duration,
    max_retries: u32,
    retry_delay: Duration,
    /// Start time reserved by the most recent request
    last_slot: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;
        Ok(Self::with_client(client, config))
    }

    /// Builds a fetcher around an existing client
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            robots: config.crawler.obey_robots.then(RobotsCache::new),
            robots_agent: config.user_agent.crawler_name.clone(),
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
            max_retries: config.crawler.max_retries,
            retry_delay: Duration::from_millis(config.crawler.retry_delay_ms),
            last_slot: Mutex::new(None),
        }
    }

    /// Waits until `delay` has passed since the previous request started
    ///
    /// Each caller reserves its own start time under the lock and sleeps
    /// outside it, so concurrent tasks queue up one `delay` apart.
    async fn wait_for_turn(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }

        let start = {
            let mut last = self.last_slot.lock().await;
            let now = Instant::now();
            let start = match *last {
                Some(previous) if previous + delay > now => previous + delay,
                _ => now,
            };
            *last = Some(start);
            start
        };

        tokio::time::sleep_until(start).await;
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(FetchError::ContentMismatch {
                    url: url.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut delay = self.request_delay;

        if let Some(cache) = &self.robots {
            let robots = cache.get_or_fetch(&self.client, url).await;
            if !robots.is_allowed(url.as_str(), &self.robots_agent) {
                return Err(FetchError::RobotsDenied {
                    url: url.to_string(),
                });
            }
            if let Some(secs) = robots
                .crawl_delay(&self.robots_agent)
                .filter(|secs| secs.is_finite() && *secs > 0.0)
            {
                delay = delay.max(Duration::from_secs_f64(secs.min(MAX_CRAWL_DELAY_SECS)));
            }
        }

        let mut attempt = 0;
        loop {
            self.wait_for_turn(delay).await;

            match self.fetch_once(url).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        url = %url,
                        attempt,
                        max_retries = self.max_retries,
                        "Retrying after: {}",
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
