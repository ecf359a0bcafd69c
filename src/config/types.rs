use serde::{Deserialize, Serialize};
use shelfmark_common::MediaKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub roots: Vec<LibraryRoot>,

    #[serde(default)]
    pub feeds: Vec<FeedSource>,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub scan: ScanConfig,
}

/// A user-selected library folder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryRoot {
    pub path: PathBuf,

    pub kind: MediaKind,
}

/// A subscribed RSS or JSON feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedSource {
    pub url: String,

    #[serde(default = "default_feed_kind")]
    pub kind: MediaKind,
}

fn default_feed_kind() -> MediaKind {
    MediaKind::Movies
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// API key for the remote catalog service.
    #[serde(default)]
    pub api_key: String,

    /// ISO-639-1 language tag for catalog responses.
    #[serde(default = "default_language")]
    pub language: String,

    /// Base URL of the catalog API. Overridable for tests.
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_catalog_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            base_url: default_catalog_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Maximum number of concurrent root/feed tasks. Defaults to
    /// `num_cpus * 2` when unset or zero.
    #[serde(default)]
    pub max_concurrency: usize,
}

impl ScanConfig {
    /// The effective concurrency bound for a scan.
    pub fn effective_concurrency(&self) -> usize {
        if self.max_concurrency > 0 {
            self.max_concurrency
        } else {
            num_cpus::get() * 2
        }
    }
}
