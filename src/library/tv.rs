//! Show and season materialization for TV scans.
//!
//! Episodes outnumber their parents: a season of files references one show
//! and one season record. The [`ShowTable`] is the per-scan lookup-or-create
//! guard that materializes each parent at most once, no matter how many
//! episode tasks race on it. Concurrent first callers coalesce onto a single
//! remote fetch via a `OnceCell` per key.

use dashmap::DashMap;
use shelfmark_common::CatalogId;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::catalog::{CatalogError, EpisodeRecord, ResolvedMedia, Resolver, SeasonRecord};

/// Per-scan guard table for show and season fetches.
#[derive(Default)]
pub struct ShowTable {
    shows: DashMap<String, Arc<OnceCell<ResolvedMedia>>>,
    seasons: DashMap<(CatalogId, u32), Arc<OnceCell<SeasonRecord>>>,
}

impl ShowTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn show_cell(&self, key: &str) -> Arc<OnceCell<ResolvedMedia>> {
        self.shows
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    fn season_cell(&self, key: (CatalogId, u32)) -> Arc<OnceCell<SeasonRecord>> {
        self.seasons
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Materialize a show by title, fetching it on first reference.
    ///
    /// Keyed case-insensitively so `loki` and `Loki` episodes share one
    /// fetch. A failed fetch leaves the cell empty; a later episode retries.
    pub async fn show(
        &self,
        title: &str,
        resolver: &Resolver,
    ) -> Result<ResolvedMedia, CatalogError> {
        let cell = self.show_cell(&title.to_lowercase());
        let media = cell
            .get_or_try_init(|| resolver.resolve_series(title))
            .await?;
        Ok(media.clone())
    }

    /// Materialize a season of an already-resolved show.
    pub async fn season(
        &self,
        show: CatalogId,
        number: u32,
        resolver: &Resolver,
    ) -> Result<SeasonRecord, CatalogError> {
        let cell = self.season_cell((show, number));
        let season = cell
            .get_or_try_init(|| resolver.resolve_season(show, number))
            .await?;
        Ok(season.clone())
    }

    /// The episode record for `(show, season, episode)`, if the season
    /// listing carries it.
    pub async fn episode(
        &self,
        show: CatalogId,
        season_number: u32,
        episode_number: u32,
        resolver: &Resolver,
    ) -> Result<Option<EpisodeRecord>, CatalogError> {
        let season = self.season(show, season_number, resolver).await?;
        Ok(season
            .episodes
            .iter()
            .find(|e| e.episode_number == episode_number)
            .cloned())
    }
}
