//! Feed fetching and parsing.
//!
//! Subscribed RSS/JSON feeds flow into the same extraction and resolution
//! path as local files: each feed item's title is pattern-matched, resolved
//! against the catalog, and emitted as a library entry with a remote source.
//! Feed type is detected from the payload, not the URL.

pub mod jsonfeed;
pub mod rss;

use chrono::{DateTime, Datelike, Utc};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error fetching or parsing a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The HTTP request failed.
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The feed endpoint answered with a non-success status.
    #[error("feed returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The payload was neither parseable RSS nor a JSON feed.
    #[error("failed to parse feed: {0}")]
    Parse(String),
}

/// One item from a parsed feed: a title to resolve and a link to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// The publication year, used as the resolver's year disambiguator.
    pub fn published_year(&self) -> Option<u16> {
        self.published.map(|d| d.year() as u16)
    }
}

/// Fetches and parses subscribed feeds.
#[derive(Debug, Clone)]
pub struct FeedIngester {
    client: reqwest::Client,
}

impl FeedIngester {
    /// Create a new feed ingester with a shared HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shelfmark/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self { client }
    }

    /// Fetch a feed document over HTTP(S) GET.
    pub async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        info!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// Parse a raw feed document, dispatching on detected type.
    pub fn parse(content: &str) -> Result<Vec<FeedItem>, FeedError> {
        if content.trim_start().starts_with('{') {
            debug!("Detected JSON feed");
            jsonfeed::parse(content)
        } else {
            debug!("Detected RSS/XML feed");
            rss::parse(content)
        }
    }

    /// Fetch and parse one subscribed feed.
    pub async fn ingest(&self, url: &str) -> Result<Vec<FeedItem>, FeedError> {
        let raw = self.fetch(url).await?;
        Self::parse(&raw)
    }
}

impl Default for FeedIngester {
    fn default() -> Self {
        Self::new()
    }
}
