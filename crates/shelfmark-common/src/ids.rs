//! Typed ID wrappers for type safety across shelfmark.
//!
//! This module provides newtype wrappers around catalog and metrics
//! identifiers to prevent mixing different kinds of identity (e.g., using a
//! MetricsId where a CatalogId is expected).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an entry in the remote catalog.
///
/// Positive values are identifiers assigned by the remote metadata service.
/// Negative values are locally synthesized placeholders for files the
/// catalog could not match; they are drawn at random so repeated synthesis
/// yields distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(i64);

impl CatalogId {
    /// Synthesize a local placeholder identity (always negative).
    #[must_use]
    pub fn placeholder() -> Self {
        let raw: i64 = rand::random::<i64>().checked_abs().unwrap_or(i64::MAX);
        Self(-raw.max(1))
    }

    /// Whether this identity was synthesized locally rather than assigned
    /// by the remote catalog.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0 < 0
    }

    /// The raw numeric value, as used in catalog API paths.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for CatalogId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<CatalogId> for i64 {
    fn from(id: CatalogId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a per-user metrics record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsId(Uuid);

impl MetricsId {
    /// Generate a new random metrics ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MetricsId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MetricsId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MetricsId> for Uuid {
    fn from(id: MetricsId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MetricsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_id_roundtrip() {
        let id = CatalogId::from(603);
        let raw: i64 = id.into();
        assert_eq!(raw, 603);
        assert!(!id.is_placeholder());
    }

    #[test]
    fn test_placeholder_is_negative() {
        for _ in 0..64 {
            let id = CatalogId::placeholder();
            assert!(id.is_placeholder());
            assert!(id.value() < 0);
        }
    }

    #[test]
    fn test_placeholder_uniqueness() {
        let a = CatalogId::placeholder();
        let b = CatalogId::placeholder();
        assert_ne!(a, b);
    }

    #[test]
    fn test_catalog_id_serialization() {
        let id = CatalogId::from(1399);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "1399");
        let back: CatalogId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_metrics_id_creation() {
        let id1 = MetricsId::new();
        let id2 = MetricsId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_metrics_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = MetricsId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_metrics_id_display() {
        let id = MetricsId::new();
        assert!(!format!("{}", id).is_empty());
    }
}
