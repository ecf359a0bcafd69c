//! Remote catalog integration.
//!
//! Provider trait and TMDB implementation, the process-wide image
//! configuration cache, and the resolver that assembles full media records.

pub mod image_config;
pub mod provider;
pub mod resolver;
pub mod tmdb;

pub use image_config::{ImageClass, ImageConfiguration, SharedImageConfig};
pub use provider::{
    CatalogError, CatalogProvider, CatalogRecord, Credit, CreditList, EpisodeRecord, ImageSet,
    SearchHit, SeasonRecord,
};
pub use resolver::{ResolvedImages, ResolvedMedia, Resolver};
pub use tmdb::TmdbProvider;
