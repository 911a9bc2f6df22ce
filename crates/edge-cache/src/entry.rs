//! Stored cache entries and lookup outcomes.

use edge_markers::MarkerSnapshot;
use serde::{Deserialize, Serialize};

/// Metadata stored next to a cached payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Markers observed when the payload was loaded.
    pub markers: MarkerSnapshot,
    /// Expiry in unix milliseconds. The entry is valid up to and including this instant.
    pub expire_at: u64,
}

impl CacheMetadata {
    /// Create metadata for a payload saved at `now_millis` with `ttl_millis`.
    pub fn new(markers: MarkerSnapshot, now_millis: u64, ttl_millis: u64) -> Self {
        Self {
            markers,
            expire_at: now_millis.saturating_add(ttl_millis),
        }
    }

    /// Check if the entry has expired at `now_millis`.
    pub fn is_expired(&self, now_millis: u64) -> bool {
        now_millis > self.expire_at
    }

    /// Remaining lifetime in milliseconds.
    pub fn remaining_millis(&self, now_millis: u64) -> u64 {
        self.expire_at.saturating_sub(now_millis)
    }
}

/// Storage key of the metadata record for a section.
pub fn metadata_key(section: &str) -> String {
    format!("{}-meta", section)
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// Valid entry with matching markers.
    Hit(T),
    /// Nothing stored for the section.
    Miss,
    /// Stored markers differ from the requested ones.
    MarkersChanged,
    /// Stored entry is past its expiry.
    Expired,
    /// Stored content could not be decoded.
    Corrupt,
}

impl<T> CacheLookup<T> {
    /// Convert into the payload, discarding the miss reason.
    pub fn into_hit(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            _ => None,
        }
    }

    /// Check if this is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hit(_) => "hit",
            Self::Miss => "miss",
            Self::MarkersChanged => "markers_changed",
            Self::Expired => "expired",
            Self::Corrupt => "corrupt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let meta = CacheMetadata::new(MarkerSnapshot::new(), 1_000, 500);

        assert_eq!(meta.expire_at, 1_500);
        assert!(!meta.is_expired(1_499));
        assert!(!meta.is_expired(1_500));
        assert!(meta.is_expired(1_501));
        assert_eq!(meta.remaining_millis(1_200), 300);
        assert_eq!(meta.remaining_millis(2_000), 0);
    }

    #[test]
    fn test_metadata_key() {
        assert_eq!(metadata_key("shopping-cart"), "shopping-cart-meta");
    }

    #[test]
    fn test_lookup_into_hit() {
        assert_eq!(CacheLookup::Hit(3).into_hit(), Some(3));
        assert_eq!(CacheLookup::<i32>::Expired.into_hit(), None);
        assert_eq!(CacheLookup::<i32>::MarkersChanged.label(), "markers_changed");
    }
}
