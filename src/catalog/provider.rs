//! Trait definition and types for remote catalog providers.
//!
//! This module defines the [`CatalogProvider`] trait that metadata backends
//! implement, along with the shared data types returned by provider queries
//! and the typed error surfaced by every remote call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shelfmark_common::{CatalogId, MediaKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error produced by remote catalog calls.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("catalog returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode catalog response: {0}")]
    Decode(String),

    /// The provider has no credentials configured.
    #[error("catalog provider is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A single result returned from a catalog search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Catalog identifier for this record.
    pub id: CatalogId,
    /// Display title of the record.
    pub title: String,
    /// Release or premiere year, if known.
    pub year: Option<u16>,
    /// Short synopsis / overview text.
    pub overview: Option<String>,
    /// How well this result matches the query (0.0 - 1.0).
    pub confidence: f64,
    /// Relative poster path, if available.
    pub poster_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Rich metadata for a movie or TV show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: CatalogId,
    pub title: String,
    pub year: Option<u16>,
    pub overview: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    /// Relative poster path (rewritten by the resolver).
    pub poster_path: Option<String>,
    /// Relative backdrop path (rewritten by the resolver).
    pub backdrop_path: Option<String>,
}

/// A season of a TV show, including its episode listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub id: CatalogId,
    pub season_number: u32,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub episodes: Vec<EpisodeRecord>,
}

/// A single episode within a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: CatalogId,
    pub episode_number: u32,
    pub title: String,
    pub overview: Option<String>,
    pub still_path: Option<String>,
    pub runtime_minutes: Option<u32>,
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

/// One cast or crew member attached to a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub name: String,
    /// Character for cast, job for crew.
    pub role: Option<String>,
    /// Relative profile-image path.
    pub profile_path: Option<String>,
}

/// Cast and crew lists for one record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditList {
    pub cast: Vec<Credit>,
    pub crew: Vec<Credit>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Relative image paths grouped by class, as returned by the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSet {
    pub posters: Vec<String>,
    pub logos: Vec<String>,
    pub backdrops: Vec<String>,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait for remote catalog backends.
///
/// Every call is a suspension point and fallible with [`CatalogError`].
/// Providers are expected to be wrapped in an `Arc` and shared across tasks.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has credentials and can serve
    /// requests.
    fn is_available(&self) -> bool;

    /// Search for records matching `title`, optionally constrained by
    /// `year`. Results are sorted by descending confidence.
    async fn search(
        &self,
        title: &str,
        year: Option<u16>,
        kind: MediaKind,
    ) -> Result<Vec<SearchHit>, CatalogError>;

    /// Fetch full metadata for one record. Search results carry fewer
    /// fields than a details fetch.
    async fn details(&self, id: CatalogId, kind: MediaKind) -> Result<CatalogRecord, CatalogError>;

    /// Fetch cast and crew for one record.
    async fn credits(&self, id: CatalogId, kind: MediaKind) -> Result<CreditList, CatalogError>;

    /// Fetch available artwork (relative paths) for one record.
    async fn images(&self, id: CatalogId, kind: MediaKind) -> Result<ImageSet, CatalogError>;

    /// Fetch one season of a TV show, including its episode listing.
    async fn season(&self, show: CatalogId, number: u32) -> Result<SeasonRecord, CatalogError>;

    /// Fetch the image-path configuration for rewriting relative paths into
    /// absolute URLs. Callers memoize this; providers may assume it is
    /// requested rarely.
    async fn image_configuration(
        &self,
    ) -> Result<super::image_config::ImageConfiguration, CatalogError>;
}
