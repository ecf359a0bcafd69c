//! Library entries and the identity-keyed set they live in.
//!
//! A [`LibraryEntry`] is the resolved representation of one playable asset.
//! Equality and hashing are keyed solely by catalog identity; entries are
//! value-like and replaced wholesale on each scan rather than mutated.

pub mod collector;
pub mod metrics;
pub mod tv;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_common::{CatalogId, EntryKind, MetricsId};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::catalog::Credit;

/// Where a library entry's payload lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySource {
    /// A file on a scanned library root.
    Local(PathBuf),
    /// A link from a subscribed feed.
    Remote(String),
    /// A container materialized from catalog metadata (show, season).
    Catalog,
}

/// One resolved asset plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: CatalogId,
    pub kind: EntryKind,
    pub title: String,
    pub year: Option<u16>,
    pub source: EntrySource,
    pub duration_secs: Option<f64>,
    pub added_at: DateTime<Utc>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub logo_url: Option<String>,
    pub cast: Vec<Credit>,
    pub crew: Vec<Credit>,
    /// Reference into the external per-user metrics store.
    pub metrics: MetricsId,
    /// Parent show, for seasons and episodes.
    pub show: Option<CatalogId>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub disc: Option<u32>,
    pub track: Option<u32>,
}

impl PartialEq for LibraryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LibraryEntry {}

impl Hash for LibraryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Identity-keyed set of library entries.
///
/// `insert` collapses duplicate identities last-writer-wins (entries are
/// immutable value-like objects per scan, so any writer is as good as
/// another). The set algebra mirrors the reconciliation step: `union` keeps
/// the *existing* entry on identity collision so unchanged items keep their
/// values across generations, `intersect` drops identities absent from the
/// other set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySet {
    entries: HashMap<CatalogId, LibraryEntry>,
}

impl LibrarySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any existing entry with the same identity.
    pub fn insert(&mut self, entry: LibraryEntry) {
        self.entries.insert(entry.id, entry);
    }

    /// Add every entry of `other` whose identity is not already present.
    pub fn union(&mut self, other: &LibrarySet) {
        for (id, entry) in &other.entries {
            self.entries.entry(*id).or_insert_with(|| entry.clone());
        }
    }

    /// Drop every entry whose identity is absent from `other`.
    pub fn intersect(&mut self, other: &LibrarySet) {
        self.entries.retain(|id, _| other.entries.contains_key(id));
    }

    /// Reconcile this set against a freshly scanned candidate set: add new
    /// identities, drop identities the scan did not rediscover, keep
    /// existing values for identities present in both.
    ///
    /// Membership afterwards is exactly `candidates`' membership.
    pub fn reconcile(&mut self, candidates: &LibrarySet) {
        self.union(candidates);
        self.intersect(candidates);
    }

    /// Merge a batch of entries produced by one scan task.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LibraryEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    pub fn get(&self, id: &CatalogId) -> Option<&LibraryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &CatalogId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.entries.values()
    }

    /// The identity set, sorted for stable assertions.
    pub fn ids(&self) -> Vec<CatalogId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<LibraryEntry> for LibrarySet {
    fn from_iter<I: IntoIterator<Item = LibraryEntry>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
pub(crate) fn test_entry(id: i64, title: &str) -> LibraryEntry {
    LibraryEntry {
        id: CatalogId::from(id),
        kind: EntryKind::Movie,
        title: title.to_string(),
        year: None,
        source: EntrySource::Local(PathBuf::from(format!("/media/{title}.mkv"))),
        duration_secs: None,
        added_at: Utc::now(),
        overview: None,
        poster_url: None,
        backdrop_url: None,
        logo_url: None,
        cast: Vec::new(),
        crew: Vec::new(),
        metrics: MetricsId::new(),
        show: None,
        season: None,
        episode: None,
        disc: None,
        track: None,
    }
}
