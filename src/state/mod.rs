//! Published library state.
//!
//! The UI layer observes the library through [`LibraryState`]: a snapshot of
//! the visible entry set plus a broadcast stream of scan lifecycle events.
//! Reconciliation is applied off to the side and swapped in as a single
//! assignment, so observers never see a half-reconciled library.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::library::LibrarySet;

const EVENT_CAPACITY: usize = 64;

/// Scan lifecycle event for observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LibraryEvent {
    /// A scan pass has started.
    ScanStarted,
    /// A scan pass completed and the visible library was replaced.
    ScanCompleted {
        added: usize,
        removed: usize,
        total: usize,
    },
    /// A scan pass failed or was cancelled; the visible library is unchanged.
    ScanFailed { error: String },
}

/// Shared, observable library state.
pub struct LibraryState {
    visible: RwLock<Arc<LibrarySet>>,
    events: broadcast::Sender<LibraryEvent>,
}

impl LibraryState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            visible: RwLock::new(Arc::new(LibrarySet::new())),
            events,
        }
    }

    /// The current visible library. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<LibrarySet> {
        self.visible.read().clone()
    }

    /// Subscribe to scan lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events.subscribe()
    }

    /// Broadcast an event. Lagging or absent receivers never block.
    pub(crate) fn emit(&self, event: LibraryEvent) {
        let _ = self.events.send(event);
    }

    /// Reconcile a freshly scanned candidate set into the visible library.
    ///
    /// The union/intersection runs on a private copy; the visible pointer is
    /// replaced in one assignment under the write lock. Returns
    /// `(added, removed)` relative to the previous generation.
    pub(crate) fn publish(&self, candidates: &LibrarySet) -> (usize, usize) {
        let mut guard = self.visible.write();

        let mut next = (**guard).clone();
        next.reconcile(candidates);

        let added = next.iter().filter(|e| !guard.contains(&e.id)).count();
        let removed = guard.iter().filter(|e| !next.contains(&e.id)).count();

        *guard = Arc::new(next);
        (added, removed)
    }
}

impl Default for LibraryState {
    fn default() -> Self {
        Self::new()
    }
}
