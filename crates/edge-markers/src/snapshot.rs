//! Marker snapshots and their comparison.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::MarkerSource;
use crate::value::MarkerValue;

/// How an absent optional marker is represented in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentMarkerPolicy {
    /// Leave absent optional markers out of the snapshot.
    ///
    /// The marker appearing later changes the key set and invalidates the cache.
    #[default]
    Omit,
    /// Record absent optional markers as an explicit `null` entry.
    Record,
}

/// The marker values observed for one request.
///
/// A `None` value is the explicit "absent" sentinel. Absent required markers are
/// always recorded so [`MarkerSnapshot::satisfies`] can see them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerSnapshot {
    markers: BTreeMap<String, Option<MarkerValue>>,
}

impl MarkerSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every required and optional marker from `source`.
    pub fn capture<S, R, O>(
        source: &S,
        required: &[R],
        optional: &[O],
        policy: AbsentMarkerPolicy,
    ) -> Self
    where
        S: MarkerSource + ?Sized,
        R: AsRef<str>,
        O: AsRef<str>,
    {
        let mut snapshot = Self::new();

        for name in required {
            let name = name.as_ref();
            snapshot.markers.insert(name.to_string(), source.read(name));
        }

        for name in optional {
            let name = name.as_ref();
            match source.read(name) {
                Some(value) => {
                    snapshot.markers.insert(name.to_string(), Some(value));
                }
                None if policy == AbsentMarkerPolicy::Record => {
                    snapshot.markers.entry(name.to_string()).or_insert(None);
                }
                None => {}
            }
        }

        snapshot
    }

    /// Add a present marker.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MarkerValue>) -> Self {
        self.markers.insert(name.into(), Some(value.into()));
        self
    }

    /// Add an explicitly absent marker.
    pub fn with_absent(mut self, name: impl Into<String>) -> Self {
        self.markers.insert(name.into(), None);
        self
    }

    /// Check that every required marker is present with a value.
    pub fn satisfies<R: AsRef<str>>(&self, required: &[R]) -> bool {
        required
            .iter()
            .all(|name| matches!(self.markers.get(name.as_ref()), Some(Some(_))))
    }

    /// Names of required markers missing from this snapshot.
    pub fn missing<'a, R: AsRef<str>>(&self, required: &'a [R]) -> Vec<&'a str> {
        required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !matches!(self.markers.get(*name), Some(Some(_))))
            .collect()
    }

    /// Structural equality: same key set, same value for every key.
    pub fn is_same(&self, other: &MarkerSnapshot) -> bool {
        if self.markers.len() != other.markers.len() {
            return false;
        }

        self.markers
            .iter()
            .all(|(name, value)| other.markers.get(name) == Some(value))
    }

    /// Canonical JSON text of this snapshot (keys sorted).
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(&self.markers).unwrap_or_default()
    }

    /// Get a marker. The outer `Option` is membership, the inner one presence.
    pub fn get(&self, name: &str) -> Option<Option<&MarkerValue>> {
        self.markers.get(name).map(Option::as_ref)
    }

    /// Number of entries (including absent sentinels).
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Check if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Iterate over entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&MarkerValue>)> {
        self.markers.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

impl std::fmt::Display for MarkerSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticMarkers;

    fn markers() -> StaticMarkers {
        StaticMarkers::new()
            .with("cart", "cart123")
            .with("wishlist", "wishlist123")
    }

    #[test]
    fn test_capture_required_present() {
        let snapshot = MarkerSnapshot::capture(
            &markers(),
            &["cart"],
            &[] as &[&str],
            AbsentMarkerPolicy::Omit,
        );

        assert!(snapshot.satisfies(&["cart"]));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_capture_required_absent_is_recorded() {
        let snapshot = MarkerSnapshot::capture(
            &markers(),
            &["customer"],
            &[] as &[&str],
            AbsentMarkerPolicy::Omit,
        );

        assert!(!snapshot.satisfies(&["customer"]));
        assert_eq!(snapshot.get("customer"), Some(None));
        assert_eq!(snapshot.missing(&["customer"]), vec!["customer"]);
    }

    #[test]
    fn test_capture_optional_omit_policy() {
        let snapshot = MarkerSnapshot::capture(
            &markers(),
            &["cart"],
            &["compare", "wishlist"],
            AbsentMarkerPolicy::Omit,
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("compare"), None);
        assert_eq!(snapshot.fingerprint(), r#"{"cart":"cart123","wishlist":"wishlist123"}"#);
    }

    #[test]
    fn test_capture_optional_record_policy() {
        let snapshot = MarkerSnapshot::capture(
            &markers(),
            &["cart"],
            &["compare"],
            AbsentMarkerPolicy::Record,
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("compare"), Some(None));
        assert_eq!(snapshot.fingerprint(), r#"{"cart":"cart123","compare":null}"#);
    }

    #[test]
    fn test_is_same_identical() {
        let a = MarkerSnapshot::new().with("a", 1i64);
        let b = MarkerSnapshot::new().with("a", 1i64);
        assert!(a.is_same(&b));
    }

    #[test]
    fn test_is_same_detects_extra_key() {
        let stored = MarkerSnapshot::new().with("a", 1i64);
        let current = MarkerSnapshot::new().with("a", 1i64).with("b", 2i64);
        assert!(!stored.is_same(&current));
        assert!(!current.is_same(&stored));
    }

    #[test]
    fn test_is_same_detects_value_change() {
        let stored = MarkerSnapshot::new().with("a", 1i64);
        let current = MarkerSnapshot::new().with("a", 2i64);
        assert!(!stored.is_same(&current));
    }

    #[test]
    fn test_is_same_detects_renamed_key() {
        let stored = MarkerSnapshot::new().with("a", 1i64);
        let current = MarkerSnapshot::new().with("b", 1i64);
        assert!(!stored.is_same(&current));
    }

    #[test]
    fn test_is_same_is_strict_about_types() {
        let stored = MarkerSnapshot::new().with("a", 1i64);
        let current = MarkerSnapshot::new().with("a", "1");
        assert!(!stored.is_same(&current));
    }

    #[test]
    fn test_absent_sentinel_differs_from_missing_key() {
        let recorded = MarkerSnapshot::new().with("a", 1i64).with_absent("b");
        let omitted = MarkerSnapshot::new().with("a", 1i64);
        assert!(!recorded.is_same(&omitted));
    }

    #[test]
    fn test_fingerprint_roundtrip() {
        let snapshot = MarkerSnapshot::new().with("b", "x").with("a", 3i64).with_absent("c");
        let text = snapshot.fingerprint();
        assert_eq!(text, r#"{"a":3,"b":"x","c":null}"#);

        let parsed: MarkerSnapshot = serde_json::from_str(&text).unwrap();
        assert!(parsed.is_same(&snapshot));
    }
}
