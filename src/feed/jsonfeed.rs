//! JSON Feed parsing.
//!
//! Deserializes the JSON Feed 1.x shape. The item link is `url`, falling
//! back to `external_url`; `date_published` is RFC 3339.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{FeedError, FeedItem};

#[derive(Debug, Deserialize)]
struct JsonFeedDocument {
    #[serde(default)]
    items: Vec<JsonFeedItem>,
}

#[derive(Debug, Deserialize)]
struct JsonFeedItem {
    title: Option<String>,
    url: Option<String>,
    external_url: Option<String>,
    date_published: Option<String>,
}

/// Parse a JSON Feed document into feed items.
pub fn parse(content: &str) -> Result<Vec<FeedItem>, FeedError> {
    let document: JsonFeedDocument =
        serde_json::from_str(content).map_err(|e| FeedError::Parse(e.to_string()))?;

    let items: Vec<FeedItem> = document
        .items
        .into_iter()
        .filter_map(|item| {
            let title = item.title.filter(|t| !t.trim().is_empty())?;
            let link = item
                .url
                .or(item.external_url)
                .filter(|l| !l.trim().is_empty())?;
            let published = item.date_published.and_then(|d| parse_date(&d));
            Some(FeedItem {
                title,
                link,
                published,
            })
        })
        .collect();

    debug!("Parsed {} items from JSON feed", items.len());
    Ok(items)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
