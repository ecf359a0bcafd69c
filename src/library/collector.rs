//! The reconciling collector.
//!
//! Fans out one task per library root and one per subscribed feed into a
//! bounded [`JoinSet`], accumulates every task's entries into a single
//! identity-keyed candidate set, and reconciles that set into the published
//! library state in one atomic swap.
//!
//! Failure policy: per-item resolution failures are logged and skipped
//! inside the tasks; a root or feed that fails outright loses only its own
//! contribution; the scan as a whole errors only when every task failed or
//! a superseding scan cancelled it. At most one scan is in flight at a
//! time - starting a new one cancels its predecessor, and a cancelled
//! scan's partial results are never published.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{FeedSource, LibraryRoot, ScanConfig};
use crate::feed::{FeedError, FeedIngester};
use crate::library::tv::ShowTable;
use crate::library::{EntrySource, LibraryEntry, LibrarySet};
use crate::scanner::{extractor, ExtractedIdentity, RootScanError, Scanner};
use crate::state::{LibraryEvent, LibraryState};

/// Terminal outcome of a whole scan pass.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A superseding scan request cancelled this pass; partial results were
    /// discarded.
    #[error("scan cancelled by a superseding request")]
    Cancelled,

    /// Every root and feed task failed.
    #[error("all {failed} scan tasks failed")]
    AllTasksFailed { failed: usize },
}

/// Failure of a single root or feed task. Sibling tasks are unaffected.
#[derive(Debug, thiserror::Error)]
enum TaskFailure {
    #[error(transparent)]
    Root(RootScanError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("scan cancelled")]
    Cancelled,
}

/// Orchestrates scan passes and owns the published library state.
pub struct Collector {
    scanner: Arc<Scanner>,
    ingester: FeedIngester,
    state: Arc<LibraryState>,
    config: ScanConfig,
    /// Token of the in-flight scan, if any. Guarded so cancel-and-replace
    /// and publish are mutually exclusive.
    current: Mutex<Option<CancellationToken>>,
}

impl Collector {
    pub fn new(scanner: Scanner, state: Arc<LibraryState>, config: ScanConfig) -> Self {
        Self {
            scanner: Arc::new(scanner),
            ingester: FeedIngester::new(),
            state,
            config,
            current: Mutex::new(None),
        }
    }

    /// The observable library state this collector publishes into.
    pub fn state(&self) -> &Arc<LibraryState> {
        &self.state
    }

    /// Run one full scan pass over the given roots and feeds.
    ///
    /// On success the visible library's membership is exactly the candidate
    /// set discovered by this pass, and a snapshot of it is returned.
    pub async fn scan(
        &self,
        roots: &[LibraryRoot],
        feeds: &[FeedSource],
    ) -> Result<Arc<LibrarySet>, ScanError> {
        // Cancel any in-flight scan before starting; at most one is active.
        let token = {
            let mut current = self.current.lock();
            if let Some(previous) = current.take() {
                info!("Superseding in-flight scan");
                previous.cancel();
            }
            let token = CancellationToken::new();
            *current = Some(token.clone());
            token
        };

        self.state.emit(LibraryEvent::ScanStarted);
        info!(roots = roots.len(), feeds = feeds.len(), "Scan started");

        let semaphore = Arc::new(Semaphore::new(self.config.effective_concurrency()));
        let shows = Arc::new(ShowTable::new());
        let mut tasks: JoinSet<Result<Vec<LibraryEntry>, TaskFailure>> = JoinSet::new();

        for root in roots.iter().cloned() {
            let scanner = self.scanner.clone();
            let shows = shows.clone();
            let semaphore = semaphore.clone();
            let token = token.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                scan_root_task(&scanner, &root, &shows, &token).await
            });
        }

        for feed in feeds.iter().cloned() {
            let scanner = self.scanner.clone();
            let ingester = self.ingester.clone();
            let shows = shows.clone();
            let semaphore = semaphore.clone();
            let token = token.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                ingest_feed_task(&scanner, &ingester, &feed, &shows, &token).await
            });
        }

        let task_count = tasks.len();
        let mut candidates = LibrarySet::new();
        let mut failed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(entries)) => candidates.extend(entries),
                Ok(Err(TaskFailure::Cancelled)) => {}
                Ok(Err(failure)) => {
                    warn!("Scan task failed: {failure}");
                    failed += 1;
                }
                Err(join_error) => {
                    warn!("Scan task panicked: {join_error}");
                    failed += 1;
                }
            }
        }

        if token.is_cancelled() {
            self.state.emit(LibraryEvent::ScanFailed {
                error: ScanError::Cancelled.to_string(),
            });
            return Err(ScanError::Cancelled);
        }

        if task_count > 0 && failed == task_count {
            let error = ScanError::AllTasksFailed { failed };
            self.state.emit(LibraryEvent::ScanFailed {
                error: error.to_string(),
            });
            return Err(error);
        }

        // Publish under the scan registration lock so a superseding scan
        // cannot interleave between the cancellation check and the swap.
        {
            let mut current = self.current.lock();
            if token.is_cancelled() {
                self.state.emit(LibraryEvent::ScanFailed {
                    error: ScanError::Cancelled.to_string(),
                });
                return Err(ScanError::Cancelled);
            }

            let (added, removed) = self.state.publish(&candidates);
            *current = None;

            info!(
                added = added,
                removed = removed,
                total = candidates.len(),
                "Scan complete"
            );
            self.state.emit(LibraryEvent::ScanCompleted {
                added,
                removed,
                total: candidates.len(),
            });
        }

        Ok(self.state.snapshot())
    }
}

/// Scan one root directory into entries.
async fn scan_root_task(
    scanner: &Scanner,
    root: &LibraryRoot,
    shows: &ShowTable,
    token: &CancellationToken,
) -> Result<Vec<LibraryEntry>, TaskFailure> {
    if token.is_cancelled() {
        return Err(TaskFailure::Cancelled);
    }

    let outcome = scanner
        .scan_root(root, shows, token)
        .await
        .map_err(|e| match e {
            RootScanError::Cancelled => TaskFailure::Cancelled,
            other => TaskFailure::Root(other),
        })?;

    for failure in &outcome.failures {
        warn!(root = ?root.path, "Subtree skipped: {failure}");
    }
    if outcome.skipped > 0 {
        info!(root = ?root.path, skipped = outcome.skipped, "Files skipped for metadata");
    }

    Ok(outcome.entries)
}

/// Fetch one feed and resolve its items into entries.
async fn ingest_feed_task(
    scanner: &Scanner,
    ingester: &FeedIngester,
    feed: &FeedSource,
    shows: &ShowTable,
    token: &CancellationToken,
) -> Result<Vec<LibraryEntry>, TaskFailure> {
    if token.is_cancelled() {
        return Err(TaskFailure::Cancelled);
    }

    let items = ingester.ingest(&feed.url).await?;

    let mut entries = Vec::new();
    for item in items {
        if token.is_cancelled() {
            return Err(TaskFailure::Cancelled);
        }

        let Some(identity) = extractor::extract(&item.title, feed.kind) else {
            continue;
        };

        // The publication date supplies the year disambiguator when the
        // title itself carries none.
        let identity = match identity {
            ExtractedIdentity::Movie { title, year: None } => ExtractedIdentity::Movie {
                title,
                year: item.published_year(),
            },
            other => other,
        };

        match scanner
            .build_entries(identity, EntrySource::Remote(item.link.clone()), shows)
            .await
        {
            Ok(batch) => entries.extend(batch),
            Err(e) => {
                warn!(feed = %feed.url, item = %item.title, "Failed to resolve feed item: {e:#}");
            }
        }
    }

    Ok(entries)
}
