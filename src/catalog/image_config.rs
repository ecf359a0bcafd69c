//! Remote image-path configuration.
//!
//! The catalog returns artwork as relative paths (`/abc123.jpg`); turning
//! them into fetchable URLs requires the service's image base URL and size
//! buckets, which are themselves fetched from the service. The configuration
//! is fetched at most once per process: the first caller populates a
//! [`tokio::sync::OnceCell`], concurrent callers await the same
//! initialization, and later callers reuse the cached value.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::provider::{CatalogError, CatalogProvider};

/// Image class, selecting a size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClass {
    Poster,
    Backdrop,
    Logo,
    Profile,
    Still,
}

/// Mapping from relative image path + class to an absolute URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfiguration {
    pub secure_base_url: String,
    pub poster_size: String,
    pub backdrop_size: String,
    pub logo_size: String,
    pub profile_size: String,
    pub still_size: String,
}

impl ImageConfiguration {
    fn size_for(&self, class: ImageClass) -> &str {
        match class {
            ImageClass::Poster => &self.poster_size,
            ImageClass::Backdrop => &self.backdrop_size,
            ImageClass::Logo => &self.logo_size,
            ImageClass::Profile => &self.profile_size,
            ImageClass::Still => &self.still_size,
        }
    }

    /// Rewrite a relative catalog path into an absolute, size-bucketed URL.
    pub fn absolute_url(&self, class: ImageClass, relative: &str) -> String {
        format!(
            "{}{}{}",
            self.secure_base_url,
            self.size_for(class),
            relative
        )
    }

    /// Rewrite a whole list of relative paths.
    pub fn absolute_urls(&self, class: ImageClass, relative: &[String]) -> Vec<String> {
        relative
            .iter()
            .map(|p| self.absolute_url(class, p))
            .collect()
    }
}

/// Process-wide, single-assignment cache of the image configuration.
///
/// Cloning shares the underlying cell; all resolver calls in one session see
/// the same fetched value.
#[derive(Debug, Clone, Default)]
pub struct SharedImageConfig {
    cell: Arc<OnceCell<ImageConfiguration>>,
}

impl SharedImageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configuration, fetching it from the provider on first use.
    ///
    /// Concurrent first callers coalesce onto one fetch; a failed fetch
    /// leaves the cell empty so a later call can retry.
    pub async fn get_or_fetch(
        &self,
        provider: &dyn CatalogProvider,
    ) -> Result<&ImageConfiguration, CatalogError> {
        self.cell
            .get_or_try_init(|| provider.image_configuration())
            .await
    }

    /// The cached value, if a fetch has completed.
    pub fn get(&self) -> Option<&ImageConfiguration> {
        self.cell.get()
    }
}
