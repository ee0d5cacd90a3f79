//! Per-origin robots.txt cache
//!
//! Each origin's robots.txt is fetched once per run and shared by every page
//! task through an async mutex.

use crate::robots::ParsedRobots;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, Arc<ParsedRobots>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the robots.txt rules for the URL's origin, fetching them on first use
    ///
    /// Two tasks racing on a new origin may both fetch; the first stored
    /// result wins and the lock is never held across the request.
    pub async fn get_or_fetch(&self, client: &Client, url: &Url) -> Arc<ParsedRobots> {
        let origin = url.origin().ascii_serialization();

        if let Some(robots) = self.entries.lock().await.get(&origin) {
            return Arc::clone(robots);
        }

        let robots = Arc::new(fetch_robots(client, &origin).await);

        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry(origin).or_insert(robots))
    }
}

/// Fetches and parses `<origin>/robots.txt`
///
/// Anything other than a successful response means no restrictions.
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin);

    match client.get(&robots_url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => {
                tracing::debug!(url = %robots_url, "Loaded robots.txt");
                ParsedRobots::from_content(&body)
            }
            Err(e) => {
                tracing::debug!(url = %robots_url, "Failed to read robots.txt: {}", e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!(
                url = %robots_url,
                status = response.status().as_u16(),
                "No robots.txt, allowing all"
            );
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::debug!(url = %robots_url, "Failed to fetch robots.txt: {}", e);
            ParsedRobots::allow_all()
        }
    }
}
