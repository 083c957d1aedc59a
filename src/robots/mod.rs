//! Robots.txt handling
//!
//! robots.txt is fetched once per origin, the first time a URL on that
//! origin is about to be requested, and kept for the rest of the run.

mod rules;

pub use rules::RobotsRules;

use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// Fetches and parses robots.txt for the origin of `url`
///
/// A 4xx response means there are no restrictions. Server errors and
/// network failures are logged and also treated as allow-all, so an
/// unreachable robots.txt never blocks the crawl.
pub async fn fetch_robots(client: &Client, url: &Url) -> RobotsRules {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", url, e);
            return RobotsRules::allow_all();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    let status = response.status();
    if !status.is_success() {
        if status.is_server_error() {
            tracing::warn!("{} returned HTTP {}", robots_url, status.as_u16());
        } else {
            tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, status.as_u16());
        }
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Loaded {} ({} bytes)", robots_url, body.len());
            RobotsRules::parse(&body)
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}

/// Per-origin robots.txt rules for one run
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, RobotsRules>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rules for the origin of `url`, fetching them on first use
    ///
    /// The boolean is true when this call performed the fetch.
    pub async fn rules_for(&mut self, client: &Client, url: &Url) -> (&RobotsRules, bool) {
        let origin = url.origin().ascii_serialization();
        let fetched = !self.entries.contains_key(&origin);

        if fetched {
            let rules = fetch_robots(client, url).await;
            self.entries.insert(origin.clone(), rules);
        }

        let rules = self
            .entries
            .entry(origin)
            .or_insert_with(RobotsRules::allow_all);
        (rules, fetched)
    }

    /// Number of origins whose robots.txt has been looked up
    pub fn origin_count(&self) -> usize {
        self.entries.len()
    }
}
