//! Media library scanner.
//!
//! This module turns one library root into resolved [`LibraryEntry`] values:
//! it walks the directory tree, classifies leaf files, extracts structured
//! identity from filenames, resolves that identity against the remote
//! catalog, and attaches per-user metrics references. Feed items share the
//! same resolution path via [`Scanner::build_entries`].

pub mod classifier;
pub mod extractor;
pub mod probe;
pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use shelfmark_common::{EntryKind, FileKind, MediaKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::catalog::{ResolvedMedia, Resolver};
use crate::config::LibraryRoot;
use crate::library::metrics::MetricsStore;
use crate::library::tv::ShowTable;
use crate::library::{EntrySource, LibraryEntry};

pub use classifier::FileClassifier;
pub use extractor::ExtractedIdentity;
pub use walker::{ScannedFile, WalkFailure, WalkOutcome};

/// Terminal failure of one root-directory task.
#[derive(Debug, thiserror::Error)]
pub enum RootScanError {
    /// The root itself could not be opened; subtree failures below a
    /// readable root are not terminal.
    #[error("library root {0:?} is not readable: {1}")]
    Unreadable(PathBuf, std::io::Error),

    /// The scan was cancelled by a superseding request.
    #[error("scan cancelled")]
    Cancelled,
}

/// Result of scanning one library root.
#[derive(Debug, Default)]
pub struct RootOutcome {
    pub entries: Vec<LibraryEntry>,
    /// Files visited but skipped for metadata (no identity, resolution
    /// failure, not playable).
    pub skipped: usize,
    /// Unreadable subtrees, rendered for logging.
    pub failures: Vec<String>,
}

/// Scanner for discovering and resolving media files.
pub struct Scanner {
    classifier: FileClassifier,
    resolver: Resolver,
    metrics: Arc<dyn MetricsStore>,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new(resolver: Resolver, metrics: Arc<dyn MetricsStore>) -> Self {
        Self {
            classifier: FileClassifier::new(),
            resolver,
            metrics,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Scan one library root: walk, classify, extract, resolve.
    ///
    /// Directory enumeration is blocking and runs on the blocking pool.
    /// Per-file resolution failures are logged and skipped; only an
    /// unreadable root or cancellation fails the task.
    pub async fn scan_root(
        &self,
        root: &LibraryRoot,
        shows: &ShowTable,
        cancel: &CancellationToken,
    ) -> std::result::Result<RootOutcome, RootScanError> {
        let path = root.path.clone();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| RootScanError::Unreadable(path.clone(), e))?;
        if !meta.is_dir() {
            return Err(RootScanError::Unreadable(
                path,
                std::io::Error::other("not a directory"),
            ));
        }

        let walk_path = path.clone();
        let walked = tokio::task::spawn_blocking(move || walker::walk(&walk_path))
            .await
            .map_err(|e| RootScanError::Unreadable(path.clone(), std::io::Error::other(e)))?;

        let mut outcome = RootOutcome {
            failures: walked.failures.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        };

        for file in walked.files {
            if cancel.is_cancelled() {
                return Err(RootScanError::Cancelled);
            }

            // Extension-inconclusive files go through the slow header probe.
            let kind = match file.kind {
                Some(kind) => kind,
                None => probe::probe_file(&file.path).await,
            };
            if !kind.is_playable() {
                continue;
            }

            let Some(identity) = extractor::extract_from_path(&file.path, root.kind) else {
                debug!("No identity in filename, skipping {:?}", file.path);
                outcome.skipped += 1;
                continue;
            };

            match self
                .build_entries(identity, EntrySource::Local(file.path.clone()), shows)
                .await
            {
                Ok(batch) => outcome.entries.extend(batch),
                Err(e) => {
                    warn!("Failed to resolve {:?}: {e:#}", file.path);
                    outcome.skipped += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Classify a single path, fast path first, probing when inconclusive.
    pub async fn classify(&self, path: &std::path::Path) -> FileKind {
        self.classifier.classify(path).await
    }

    /// Resolve one extracted identity into library entries.
    ///
    /// Movies and tracks yield one entry. Episodes materialize their show
    /// and season parents (at most one fetch per parent per scan, via the
    /// [`ShowTable`] guard) and yield parent entries alongside the episode.
    pub async fn build_entries(
        &self,
        identity: ExtractedIdentity,
        source: EntrySource,
        shows: &ShowTable,
    ) -> Result<Vec<LibraryEntry>> {
        match identity {
            ExtractedIdentity::Movie { title, year } => {
                let media = self.resolver.resolve(&title, year, MediaKind::Movies).await?;
                let entry = self
                    .entry_from_media(EntryKind::Movie, source, &media)
                    .await?;
                Ok(vec![entry])
            }
            ExtractedIdentity::Track { title, disc, track } => {
                let media = self.resolver.resolve(&title, None, MediaKind::Music).await?;
                let mut entry = self
                    .entry_from_media(EntryKind::Track, source, &media)
                    .await?;
                entry.disc = disc;
                entry.track = track;
                Ok(vec![entry])
            }
            ExtractedIdentity::Episode {
                title,
                season,
                episode,
            } => {
                self.build_episode_entries(&title, season, episode, source, shows)
                    .await
            }
        }
    }

    async fn build_episode_entries(
        &self,
        title: &str,
        season: u32,
        episode: u32,
        source: EntrySource,
        shows: &ShowTable,
    ) -> Result<Vec<LibraryEntry>> {
        let show_media = shows.show(title, &self.resolver).await?;
        let show_id = show_media.record.id;

        let mut entries = Vec::with_capacity(3);
        let show_entry = self
            .entry_from_media(EntryKind::Series, EntrySource::Catalog, &show_media)
            .await?;
        entries.push(show_entry);

        if !show_media.matched {
            // Unmatched show: no season listing to consult; the episode
            // still enters the library under a synthesized identity.
            let mut entry = self
                .entry_from_media(EntryKind::Episode, source, &show_media)
                .await?;
            entry.id = shelfmark_common::CatalogId::placeholder();
            entry.metrics = self.metrics.get_or_create(entry.id).await?.id;
            entry.show = Some(show_id);
            entry.season = Some(season);
            entry.episode = Some(episode);
            entries.push(entry);
            return Ok(entries);
        }

        let season_record = shows.season(show_id, season, &self.resolver).await?;
        let metrics = self.metrics.get_or_create(season_record.id).await?;
        entries.push(LibraryEntry {
            id: season_record.id,
            kind: EntryKind::Season,
            title: season_record.title.clone(),
            year: show_media.record.year,
            source: EntrySource::Catalog,
            duration_secs: None,
            added_at: Utc::now(),
            overview: season_record.overview.clone(),
            poster_url: season_record.poster_path.clone(),
            backdrop_url: show_media.backdrop_url.clone(),
            logo_url: None,
            cast: Vec::new(),
            crew: Vec::new(),
            metrics: metrics.id,
            show: Some(show_id),
            season: Some(season),
            episode: None,
            disc: None,
            track: None,
        });

        let episode_record = season_record
            .episodes
            .iter()
            .find(|e| e.episode_number == episode)
            .cloned();

        let (id, ep_title, overview, still, runtime) = match episode_record {
            Some(record) => (
                record.id,
                record.title,
                record.overview,
                record.still_path,
                record.runtime_minutes,
            ),
            None => (
                shelfmark_common::CatalogId::placeholder(),
                format!("{title} S{season:02}E{episode:02}"),
                None,
                None,
                None,
            ),
        };

        let metrics = self.metrics.get_or_create(id).await?;
        entries.push(LibraryEntry {
            id,
            kind: EntryKind::Episode,
            title: ep_title,
            year: show_media.record.year,
            source,
            duration_secs: runtime.map(|m| f64::from(m) * 60.0),
            added_at: Utc::now(),
            overview,
            poster_url: still,
            backdrop_url: show_media.backdrop_url.clone(),
            logo_url: show_media.logo_url.clone(),
            cast: show_media.credits.cast.clone(),
            crew: show_media.credits.crew.clone(),
            metrics: metrics.id,
            show: Some(show_id),
            season: Some(season),
            episode: Some(episode),
            disc: None,
            track: None,
        });

        Ok(entries)
    }

    async fn entry_from_media(
        &self,
        kind: EntryKind,
        source: EntrySource,
        media: &ResolvedMedia,
    ) -> Result<LibraryEntry> {
        let metrics = self.metrics.get_or_create(media.record.id).await?;
        Ok(LibraryEntry {
            id: media.record.id,
            kind,
            title: media.record.title.clone(),
            year: media.record.year,
            source,
            duration_secs: media.record.runtime_minutes.map(|m| f64::from(m) * 60.0),
            added_at: Utc::now(),
            overview: media.record.overview.clone(),
            poster_url: media.poster_url.clone(),
            backdrop_url: media.backdrop_url.clone(),
            logo_url: media.logo_url.clone(),
            cast: media.credits.cast.clone(),
            crew: media.credits.crew.clone(),
            metrics: metrics.id,
            show: None,
            season: None,
            episode: None,
            disc: None,
            track: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::provider::{
        CatalogError, CatalogProvider, CatalogRecord, CreditList, EpisodeRecord, ImageSet,
        SearchHit, SeasonRecord,
    };
    use crate::catalog::ImageConfiguration;
    use crate::library::metrics::MemoryMetricsStore;
    use async_trait::async_trait;
    use shelfmark_common::CatalogId;
    use std::fs;

    /// Provider that matches any movie title to a fixed record and serves
    /// one show with one season.
    struct FixtureProvider;

    #[async_trait]
    impl CatalogProvider for FixtureProvider {
        fn name(&self) -> &'static str {
            "fixture"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn search(
            &self,
            title: &str,
            year: Option<u16>,
            _kind: MediaKind,
        ) -> Result<Vec<SearchHit>, CatalogError> {
            if title.contains("Unknown") {
                return Ok(Vec::new());
            }
            Ok(vec![SearchHit {
                id: CatalogId::from(100),
                title: title.to_string(),
                year,
                overview: None,
                confidence: 0.9,
                poster_path: None,
            }])
        }

        async fn details(
            &self,
            id: CatalogId,
            _kind: MediaKind,
        ) -> Result<CatalogRecord, CatalogError> {
            Ok(CatalogRecord {
                id,
                title: "Matched".into(),
                year: Some(2020),
                overview: Some("overview".into()),
                runtime_minutes: Some(120),
                genres: Vec::new(),
                poster_path: Some("/p.jpg".into()),
                backdrop_path: None,
            })
        }

        async fn credits(
            &self,
            _id: CatalogId,
            _kind: MediaKind,
        ) -> Result<CreditList, CatalogError> {
            Ok(CreditList::default())
        }

        async fn images(&self, _id: CatalogId, _kind: MediaKind) -> Result<ImageSet, CatalogError> {
            Ok(ImageSet::default())
        }

        async fn season(
            &self,
            show: CatalogId,
            number: u32,
        ) -> Result<SeasonRecord, CatalogError> {
            Ok(SeasonRecord {
                id: CatalogId::from(show.value() * 10 + number as i64),
                season_number: number,
                title: format!("Season {number}"),
                overview: None,
                poster_path: None,
                episodes: vec![EpisodeRecord {
                    id: CatalogId::from(5001),
                    episode_number: 3,
                    title: "The Third".into(),
                    overview: None,
                    still_path: None,
                    runtime_minutes: Some(40),
                }],
            })
        }

        async fn image_configuration(&self) -> Result<ImageConfiguration, CatalogError> {
            Ok(ImageConfiguration {
                secure_base_url: "https://img.example/".into(),
                poster_size: "w500".into(),
                backdrop_size: "w1280".into(),
                logo_size: "w300".into(),
                profile_size: "w185".into(),
                still_size: "w300".into(),
            })
        }
    }

    fn scanner() -> Scanner {
        let resolver = Resolver::new(Arc::new(FixtureProvider));
        Scanner::new(resolver, Arc::new(MemoryMetricsStore::new()))
    }

    #[tokio::test]
    async fn scan_root_resolves_movies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Dune (2021).mkv"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not media").unwrap();

        let root = LibraryRoot {
            path: dir.path().to_path_buf(),
            kind: MediaKind::Movies,
        };
        let outcome = scanner()
            .scan_root(&root, &ShowTable::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 1);
        let entry = &outcome.entries[0];
        assert_eq!(entry.id, CatalogId::from(100));
        assert_eq!(entry.kind, EntryKind::Movie);
        assert_eq!(entry.duration_secs, Some(7200.0));
        assert!(matches!(entry.source, EntrySource::Local(_)));
    }

    #[tokio::test]
    async fn unmatched_movie_gets_placeholder_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Unknown Obscurity.mkv"), b"").unwrap();

        let root = LibraryRoot {
            path: dir.path().to_path_buf(),
            kind: MediaKind::Movies,
        };
        let outcome = scanner()
            .scan_root(&root, &ShowTable::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].id.is_placeholder());
        assert_eq!(outcome.entries[0].title, "Unknown Obscurity");
    }

    #[tokio::test]
    async fn episode_materializes_show_and_season() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Loki S01E03.mkv"), b"").unwrap();

        let root = LibraryRoot {
            path: dir.path().to_path_buf(),
            kind: MediaKind::TvShows,
        };
        let outcome = scanner()
            .scan_root(&root, &ShowTable::new(), &CancellationToken::new())
            .await
            .unwrap();

        let kinds: Vec<EntryKind> = outcome.entries.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&EntryKind::Series));
        assert!(kinds.contains(&EntryKind::Season));
        assert!(kinds.contains(&EntryKind::Episode));

        let episode = outcome
            .entries
            .iter()
            .find(|e| e.kind == EntryKind::Episode)
            .unwrap();
        assert_eq!(episode.id, CatalogId::from(5001));
        assert_eq!(episode.title, "The Third");
        assert_eq!(episode.season, Some(1));
        assert_eq!(episode.episode, Some(3));
        assert_eq!(episode.show, Some(CatalogId::from(100)));
    }

    #[tokio::test]
    async fn music_tracks_resolve_locally() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("01-Opening Theme.flac"), b"").unwrap();

        let root = LibraryRoot {
            path: dir.path().to_path_buf(),
            kind: MediaKind::Music,
        };
        let outcome = scanner()
            .scan_root(&root, &ShowTable::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 1);
        let entry = &outcome.entries[0];
        assert_eq!(entry.kind, EntryKind::Track);
        assert_eq!(entry.title, "Opening Theme");
        assert_eq!(entry.disc, Some(1));
        assert_eq!(entry.track, Some(1));
        assert!(entry.id.is_placeholder());
    }

    #[tokio::test]
    async fn missing_root_fails_task() {
        let root = LibraryRoot {
            path: PathBuf::from("/definitely/not/here"),
            kind: MediaKind::Movies,
        };
        let err = scanner()
            .scan_root(&root, &ShowTable::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RootScanError::Unreadable(_, _)));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Dune (2021).mkv"), b"").unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let root = LibraryRoot {
            path: dir.path().to_path_buf(),
            kind: MediaKind::Movies,
        };
        let err = scanner()
            .scan_root(&root, &ShowTable::new(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, RootScanError::Cancelled));
    }
}
