//! Marker sources.

use std::collections::{BTreeMap, HashMap};

use crate::value::{parse_marker_pair, MarkerParseError, MarkerValue};

/// Reads marker values by name.
///
/// Implementations must be side-effect free from the resolver's point of view;
/// a marker is read once per request.
pub trait MarkerSource: Send + Sync {
    /// Read a marker, returning `None` when it is absent.
    fn read(&self, name: &str) -> Option<MarkerValue>;
}

impl<F> MarkerSource for F
where
    F: Fn(&str) -> Option<MarkerValue> + Send + Sync,
{
    fn read(&self, name: &str) -> Option<MarkerValue> {
        self(name)
    }
}

impl MarkerSource for HashMap<String, MarkerValue> {
    fn read(&self, name: &str) -> Option<MarkerValue> {
        self.get(name).cloned()
    }
}

impl MarkerSource for BTreeMap<String, MarkerValue> {
    fn read(&self, name: &str) -> Option<MarkerValue> {
        self.get(name).cloned()
    }
}

/// A fixed set of markers.
#[derive(Debug, Clone, Default)]
pub struct StaticMarkers {
    values: BTreeMap<String, MarkerValue>,
}

impl StaticMarkers {
    /// Create an empty marker set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MarkerValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Build from `name=value` pairs.
    pub fn from_pairs<I, P>(pairs: I) -> Result<Self, MarkerParseError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut markers = Self::new();
        for pair in pairs {
            let (name, value) = parse_marker_pair(pair.as_ref())?;
            markers.values.insert(name, value);
        }
        Ok(markers)
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no markers.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl MarkerSource for StaticMarkers {
    fn read(&self, name: &str) -> Option<MarkerValue> {
        self.values.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let source = |name: &str| (name == "cart").then(|| MarkerValue::text("cart123"));

        assert_eq!(source.read("cart"), Some(MarkerValue::text("cart123")));
        assert_eq!(source.read("customer"), None);
    }

    #[test]
    fn test_map_source() {
        let mut map = HashMap::new();
        map.insert("wishlist".to_string(), MarkerValue::text("w1"));

        assert_eq!(map.read("wishlist"), Some(MarkerValue::text("w1")));
        assert_eq!(map.read("cart"), None);
    }

    #[test]
    fn test_static_markers_from_pairs() {
        let markers = StaticMarkers::from_pairs(["cart=cart123", "visits=3"]).unwrap();

        assert_eq!(markers.len(), 2);
        assert_eq!(markers.read("cart"), Some(MarkerValue::text("cart123")));
        assert_eq!(markers.read("visits"), Some(MarkerValue::from(3i64)));
    }

    #[test]
    fn test_static_markers_from_bad_pair() {
        assert!(StaticMarkers::from_pairs(["cart"]).is_err());
    }
}
