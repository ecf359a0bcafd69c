//! RSS/XML feed parsing.
//!
//! Parses RSS 2.0 documents with the quick-xml event reader. Items missing
//! either a title or a link are dropped; pubDate is parsed as RFC 2822 with
//! a handful of fallback formats and its absence is not an error.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use super::{FeedError, FeedItem};

/// Parse RSS XML content into feed items.
pub fn parse(content: &str) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current_item: Option<ItemBuilder> = None;
    let mut current_tag = String::new();
    let mut in_item = false;
    let mut saw_rss = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == "rss" || tag_name == "channel" {
                    saw_rss = true;
                }
                current_tag = tag_name.clone();

                if tag_name == "item" {
                    in_item = true;
                    current_item = Some(ItemBuilder::default());
                }
            }
            Ok(Event::End(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if tag_name == "item" {
                    in_item = false;
                    if let Some(builder) = current_item.take() {
                        if let Some(item) = builder.build() {
                            items.push(item);
                        }
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) => {
                if in_item {
                    if let Some(ref mut builder) = current_item {
                        let text = e.unescape().unwrap_or_default().to_string();
                        match current_tag.as_str() {
                            "title" => builder.title = Some(text),
                            "link" => builder.link = Some(text),
                            "pubDate" => builder.pub_date = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if in_item {
                    if let Some(ref mut builder) = current_item {
                        let text = String::from_utf8_lossy(e.as_ref()).to_string();
                        if current_tag.as_str() == "title" {
                            builder.title = Some(text);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Error parsing RSS XML: {:?}", e);
                return Err(FeedError::Parse(e.to_string()));
            }
            _ => {}
        }
    }

    if !saw_rss && items.is_empty() {
        return Err(FeedError::Parse("document is not an RSS feed".into()));
    }

    debug!("Parsed {} items from RSS feed", items.len());
    Ok(items)
}

/// Builder for RSS items during parsing
#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
}

impl ItemBuilder {
    /// Items need both a title and a resolvable link.
    fn build(self) -> Option<FeedItem> {
        let title = self.title?;
        let link = self.link?;
        if title.trim().is_empty() || link.trim().is_empty() {
            return None;
        }

        let published = self.pub_date.and_then(|s| parse_rss_date(&s));

        Some(FeedItem {
            title,
            link,
            published,
        })
    }
}

/// Parse RSS date format (RFC 2822), with common fallback variants.
fn parse_rss_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = ["%a, %d %b %Y %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%z"];
    for fmt in formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }

    debug!("Failed to parse RSS date: {}", s);
    None
}
