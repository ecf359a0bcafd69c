//! Per-user playback metrics.
//!
//! Metrics rows live in an external store; the scanner only needs
//! `get_or_create` keyed by catalog ID so every library entry can carry a
//! stable metrics reference across scans. The invariant is at most one row
//! per catalog ID, under arbitrary concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shelfmark_common::{CatalogId, MetricsId, Result};

/// One user's playback state for one catalog identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMetrics {
    pub id: MetricsId,
    pub catalog_id: CatalogId,
    pub created_at: DateTime<Utc>,
    pub last_watched: Option<DateTime<Utc>>,
    pub position_secs: f64,
}

impl UserMetrics {
    /// A fresh row for a catalog identity seen for the first time.
    pub fn new(catalog_id: CatalogId) -> Self {
        Self {
            id: MetricsId::new(),
            catalog_id,
            created_at: Utc::now(),
            last_watched: None,
            position_secs: 0.0,
        }
    }
}

/// External store of per-user metrics.
///
/// Backing persistence is out of scope; implementations must make
/// `get_or_create` safe for concurrent callers on the same catalog ID.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Look up the row for a catalog ID, creating it on first access.
    async fn get_or_create(&self, catalog_id: CatalogId) -> Result<UserMetrics>;

    /// Insert or replace a row.
    async fn insert(&self, record: UserMetrics) -> Result<()>;

    /// Fetch a row without creating it.
    async fn get(&self, catalog_id: CatalogId) -> Result<Option<UserMetrics>>;
}

/// In-process metrics store.
///
/// The dashmap entry API serializes get-or-create per catalog ID, so
/// concurrent first lookups for one identity still produce a single row.
#[derive(Debug, Default)]
pub struct MemoryMetricsStore {
    rows: DashMap<CatalogId, UserMetrics>,
}

impl MemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl MetricsStore for MemoryMetricsStore {
    async fn get_or_create(&self, catalog_id: CatalogId) -> Result<UserMetrics> {
        let row = self
            .rows
            .entry(catalog_id)
            .or_insert_with(|| UserMetrics::new(catalog_id));
        Ok(row.clone())
    }

    async fn insert(&self, record: UserMetrics) -> Result<()> {
        self.rows.insert(record.catalog_id, record);
        Ok(())
    }

    async fn get(&self, catalog_id: CatalogId) -> Result<Option<UserMetrics>> {
        Ok(self.rows.get(&catalog_id).map(|r| r.clone()))
    }
}
