//! Identity resolution against the remote catalog.
//!
//! The [`Resolver`] turns an extracted title (+ optional year) into a fully
//! populated media record: it searches the catalog, fetches details for the
//! best match, and pulls credits and artwork in concurrent sub-tasks,
//! rewriting relative image paths into absolute URLs via the process-wide
//! [`SharedImageConfig`].
//!
//! A title the catalog cannot match never fails resolution: the resolver
//! synthesizes a local placeholder record with a unique negative identity so
//! the file stays in the library. Remote failures, by contrast, propagate as
//! [`CatalogError`] and are handled per item by the collector.

use std::sync::Arc;

use shelfmark_common::{CatalogId, MediaKind};
use tracing::debug;

use super::image_config::{ImageClass, ImageConfiguration, SharedImageConfig};
use super::provider::{
    CatalogError, CatalogProvider, CatalogRecord, CreditList, SeasonRecord,
};

/// Absolute artwork URLs grouped by class.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    pub posters: Vec<String>,
    pub logos: Vec<String>,
    pub backdrops: Vec<String>,
}

/// Fully resolved metadata for one library item.
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub record: CatalogRecord,
    /// Primary poster URL (absolute), if any.
    pub poster_url: Option<String>,
    /// Primary backdrop URL (absolute), if any.
    pub backdrop_url: Option<String>,
    /// Primary logo URL (absolute), if any.
    pub logo_url: Option<String>,
    /// All artwork, absolute URLs.
    pub images: ResolvedImages,
    /// Cast and crew, profile paths rewritten to absolute URLs.
    pub credits: CreditList,
    /// False when the record is a locally synthesized placeholder.
    pub matched: bool,
}

impl ResolvedMedia {
    fn placeholder(title: &str, year: Option<u16>) -> Self {
        Self {
            record: CatalogRecord {
                id: CatalogId::placeholder(),
                title: title.to_string(),
                year,
                overview: None,
                runtime_minutes: None,
                genres: Vec::new(),
                poster_path: None,
                backdrop_path: None,
            },
            poster_url: None,
            backdrop_url: None,
            logo_url: None,
            images: ResolvedImages::default(),
            credits: CreditList::default(),
            matched: false,
        }
    }
}

/// Resolves extracted identities against a [`CatalogProvider`].
///
/// Cheap to clone; clones share the provider and the memoized image
/// configuration.
#[derive(Clone)]
pub struct Resolver {
    provider: Arc<dyn CatalogProvider>,
    image_config: SharedImageConfig,
}

impl Resolver {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            provider,
            image_config: SharedImageConfig::new(),
        }
    }

    /// The provider backing this resolver.
    pub fn provider(&self) -> &dyn CatalogProvider {
        self.provider.as_ref()
    }

    /// Resolve a title against the catalog.
    ///
    /// Zero search hits synthesize a placeholder (`Ok`, never an error);
    /// remote failures after a hit propagate as [`CatalogError`].
    ///
    /// Music is not part of the remote catalog's domain; tracks resolve
    /// directly to local records without a network round-trip.
    pub async fn resolve(
        &self,
        title: &str,
        year: Option<u16>,
        kind: MediaKind,
    ) -> Result<ResolvedMedia, CatalogError> {
        if kind == MediaKind::Music {
            return Ok(ResolvedMedia::placeholder(title, year));
        }

        let hits = self.provider.search(title, year, kind).await?;
        let Some(hit) = hits.first() else {
            debug!(title = title, "No catalog match; synthesizing placeholder");
            return Ok(ResolvedMedia::placeholder(title, year));
        };

        // Details and the (memoized) image configuration are independent.
        let (record, config) = tokio::try_join!(
            self.provider.details(hit.id, kind),
            self.image_config.get_or_fetch(self.provider.as_ref()),
        )?;

        self.enrich(record, kind, config).await
    }

    /// Resolve a TV series by title. Used when an episode references a show
    /// the scan has not materialized yet.
    pub async fn resolve_series(&self, title: &str) -> Result<ResolvedMedia, CatalogError> {
        self.resolve(title, None, MediaKind::TvShows).await
    }

    /// Fetch one season of a show, with artwork paths rewritten.
    pub async fn resolve_season(
        &self,
        show: CatalogId,
        number: u32,
    ) -> Result<SeasonRecord, CatalogError> {
        let (mut season, config) = tokio::try_join!(
            self.provider.season(show, number),
            self.image_config.get_or_fetch(self.provider.as_ref()),
        )?;

        season.poster_path = season
            .poster_path
            .map(|p| config.absolute_url(ImageClass::Poster, &p));
        for episode in &mut season.episodes {
            episode.still_path = episode
                .still_path
                .take()
                .map(|p| config.absolute_url(ImageClass::Still, &p));
        }
        Ok(season)
    }

    /// Fetch credits and artwork for a matched record and assemble the
    /// final media. The two remote calls run concurrently; inside the
    /// images arm the three artwork classes rewrite in parallel and merge.
    async fn enrich(
        &self,
        mut record: CatalogRecord,
        kind: MediaKind,
        config: &ImageConfiguration,
    ) -> Result<ResolvedMedia, CatalogError> {
        let id = record.id;

        let (credits, images) = tokio::try_join!(
            async {
                let mut credits = self.provider.credits(id, kind).await?;
                for credit in credits.cast.iter_mut().chain(credits.crew.iter_mut()) {
                    credit.profile_path = credit
                        .profile_path
                        .take()
                        .map(|p| config.absolute_url(ImageClass::Profile, &p));
                }
                Ok(credits)
            },
            async {
                let set = self.provider.images(id, kind).await?;
                let (posters, logos, backdrops) = futures::join!(
                    async { config.absolute_urls(ImageClass::Poster, &set.posters) },
                    async { config.absolute_urls(ImageClass::Logo, &set.logos) },
                    async { config.absolute_urls(ImageClass::Backdrop, &set.backdrops) },
                );
                Ok::<_, CatalogError>(ResolvedImages {
                    posters,
                    logos,
                    backdrops,
                })
            },
        )?;

        let poster_url = record
            .poster_path
            .take()
            .map(|p| config.absolute_url(ImageClass::Poster, &p))
            .or_else(|| images.posters.first().cloned());
        let backdrop_url = record
            .backdrop_path
            .take()
            .map(|p| config.absolute_url(ImageClass::Backdrop, &p))
            .or_else(|| images.backdrops.first().cloned());
        let logo_url = images.logos.first().cloned();

        Ok(ResolvedMedia {
            record,
            poster_url,
            backdrop_url,
            logo_url,
            images,
            credits,
            matched: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::provider::{Credit, EpisodeRecord, ImageSet, SearchHit};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub provider with canned responses and call counting.
    struct StubProvider {
        hits: Vec<SearchHit>,
        config_fetches: AtomicUsize,
        fail_images: bool,
    }

    impl StubProvider {
        fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                config_fetches: AtomicUsize::new(0),
                fail_images: false,
            }
        }

        fn hit(id: i64, title: &str, year: Option<u16>) -> SearchHit {
            SearchHit {
                id: CatalogId::from(id),
                title: title.to_string(),
                year,
                overview: None,
                confidence: 0.8,
                poster_path: Some("/search-poster.jpg".into()),
            }
        }
    }

    #[async_trait]
    impl CatalogProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn search(
            &self,
            _title: &str,
            _year: Option<u16>,
            _kind: MediaKind,
        ) -> Result<Vec<SearchHit>, CatalogError> {
            Ok(self.hits.clone())
        }

        async fn details(
            &self,
            id: CatalogId,
            _kind: MediaKind,
        ) -> Result<CatalogRecord, CatalogError> {
            Ok(CatalogRecord {
                id,
                title: "Dune".into(),
                year: Some(2021),
                overview: Some("Spice.".into()),
                runtime_minutes: Some(155),
                genres: vec!["Sci-Fi".into()],
                poster_path: Some("/poster.jpg".into()),
                backdrop_path: Some("/backdrop.jpg".into()),
            })
        }

        async fn credits(
            &self,
            _id: CatalogId,
            _kind: MediaKind,
        ) -> Result<CreditList, CatalogError> {
            Ok(CreditList {
                cast: vec![Credit {
                    name: "Lead".into(),
                    role: Some("Hero".into()),
                    profile_path: Some("/face.jpg".into()),
                }],
                crew: Vec::new(),
            })
        }

        async fn images(&self, _id: CatalogId, _kind: MediaKind) -> Result<ImageSet, CatalogError> {
            if self.fail_images {
                return Err(CatalogError::Decode("boom".into()));
            }
            Ok(ImageSet {
                posters: vec!["/p1.jpg".into(), "/p2.jpg".into()],
                logos: vec!["/logo.png".into()],
                backdrops: vec!["/bd.jpg".into()],
            })
        }

        async fn season(
            &self,
            show: CatalogId,
            number: u32,
        ) -> Result<SeasonRecord, CatalogError> {
            Ok(SeasonRecord {
                id: CatalogId::from(show.value() * 100 + number as i64),
                season_number: number,
                title: format!("Season {number}"),
                overview: None,
                poster_path: Some("/season.jpg".into()),
                episodes: vec![EpisodeRecord {
                    id: CatalogId::from(9001),
                    episode_number: 1,
                    title: "Pilot".into(),
                    overview: None,
                    still_path: Some("/still.jpg".into()),
                    runtime_minutes: Some(45),
                }],
            })
        }

        async fn image_configuration(&self) -> Result<ImageConfiguration, CatalogError> {
            self.config_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(ImageConfiguration {
                secure_base_url: "https://img.example/t/p/".into(),
                poster_size: "w500".into(),
                backdrop_size: "w1280".into(),
                logo_size: "w300".into(),
                profile_size: "w185".into(),
                still_size: "w300".into(),
            })
        }
    }

    #[tokio::test]
    async fn resolve_hit_rewrites_artwork() {
        let provider = Arc::new(StubProvider::new(vec![StubProvider::hit(
            603,
            "Dune",
            Some(2021),
        )]));
        let resolver = Resolver::new(provider);

        let media = resolver
            .resolve("Dune", Some(2021), MediaKind::Movies)
            .await
            .unwrap();

        assert!(media.matched);
        assert_eq!(media.record.id, CatalogId::from(603));
        assert_eq!(
            media.poster_url.as_deref(),
            Some("https://img.example/t/p/w500/poster.jpg")
        );
        assert_eq!(
            media.backdrop_url.as_deref(),
            Some("https://img.example/t/p/w1280/backdrop.jpg")
        );
        assert_eq!(
            media.logo_url.as_deref(),
            Some("https://img.example/t/p/w300/logo.png")
        );
        assert_eq!(media.images.posters.len(), 2);
        assert_eq!(
            media.credits.cast[0].profile_path.as_deref(),
            Some("https://img.example/t/p/w185/face.jpg")
        );
    }

    #[tokio::test]
    async fn resolve_miss_synthesizes_placeholder() {
        let provider = Arc::new(StubProvider::new(Vec::new()));
        let resolver = Resolver::new(provider);

        let media = resolver
            .resolve("Completely Unknown", None, MediaKind::Movies)
            .await
            .unwrap();

        assert!(!media.matched);
        assert!(media.record.id.is_placeholder());
        assert_eq!(media.record.title, "Completely Unknown");
        assert!(media.poster_url.is_none());
    }

    #[tokio::test]
    async fn placeholder_identity_unique_across_calls() {
        let provider = Arc::new(StubProvider::new(Vec::new()));
        let resolver = Resolver::new(provider);

        let a = resolver
            .resolve("Same Title", None, MediaKind::Movies)
            .await
            .unwrap();
        let b = resolver
            .resolve("Same Title", None, MediaKind::Movies)
            .await
            .unwrap();
        assert_ne!(a.record.id, b.record.id);
    }

    #[tokio::test]
    async fn music_resolves_locally() {
        let provider = Arc::new(StubProvider::new(vec![StubProvider::hit(1, "x", None)]));
        let resolver = Resolver::new(provider.clone());

        let media = resolver
            .resolve("Echoes", None, MediaKind::Music)
            .await
            .unwrap();
        assert!(!media.matched);
        assert!(media.record.id.is_placeholder());
        // No network traffic at all: the config was never fetched.
        assert_eq!(provider.config_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn image_config_fetched_once() {
        let provider = Arc::new(StubProvider::new(vec![StubProvider::hit(
            603,
            "Dune",
            Some(2021),
        )]));
        let resolver = Resolver::new(provider.clone());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let resolver = resolver.clone();
            tasks.push(tokio::spawn(async move {
                resolver.resolve("Dune", Some(2021), MediaKind::Movies).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(provider.config_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remote_failure_propagates() {
        let provider = Arc::new(StubProvider {
            hits: vec![StubProvider::hit(603, "Dune", Some(2021))],
            config_fetches: AtomicUsize::new(0),
            fail_images: true,
        });
        let resolver = Resolver::new(provider);

        let err = resolver
            .resolve("Dune", Some(2021), MediaKind::Movies)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn season_artwork_rewritten() {
        let provider = Arc::new(StubProvider::new(Vec::new()));
        let resolver = Resolver::new(provider);

        let season = resolver
            .resolve_season(CatalogId::from(1399), 1)
            .await
            .unwrap();
        assert_eq!(
            season.poster_path.as_deref(),
            Some("https://img.example/t/p/w500/season.jpg")
        );
        assert_eq!(
            season.episodes[0].still_path.as_deref(),
            Some("https://img.example/t/p/w300/still.jpg")
        );
    }
}
