//! Section definitions and the section registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named section, its placeholder and the markers gating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    /// Section name.
    pub name: String,
    /// Value served while required markers are absent.
    pub placeholder: Value,
    /// Markers that must all be present before the section is loaded.
    #[serde(default)]
    pub required: Vec<String>,
    /// Markers that only take part in the cache fingerprint.
    #[serde(default)]
    pub optional: Vec<String>,
}

impl SectionDefinition {
    /// Create a section with no markers.
    pub fn new(name: impl Into<String>, placeholder: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            placeholder: placeholder.into(),
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// Add a required marker.
    pub fn require(mut self, marker: impl Into<String>) -> Self {
        self.required.push(marker.into());
        self
    }

    /// Add an optional marker.
    pub fn optional(mut self, marker: impl Into<String>) -> Self {
        self.optional.push(marker.into());
        self
    }
}

/// Registered sections by name. Registering a name again replaces it.
#[derive(Debug, Clone, Default)]
pub struct SectionRegistry {
    sections: HashMap<String, SectionDefinition>,
}

impl SectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section, returning the definition it replaced.
    pub fn register(&mut self, definition: SectionDefinition) -> Option<SectionDefinition> {
        self.sections.insert(definition.name.clone(), definition)
    }

    /// Look up a section.
    pub fn get(&self, name: &str) -> Option<&SectionDefinition> {
        self.sections.get(name)
    }

    /// Check if a section is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Registered section names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_replaces() {
        let mut registry = SectionRegistry::new();

        let first = SectionDefinition::new("cart", json!({"total": 0})).require("cart");
        assert!(registry.register(first.clone()).is_none());

        let second = SectionDefinition::new("cart", json!({"total": -1}));
        assert_eq!(registry.register(second), Some(first));

        let current = registry.get("cart").unwrap();
        assert_eq!(current.placeholder, json!({"total": -1}));
        assert!(current.required.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = SectionRegistry::new();
        registry.register(SectionDefinition::new("wishlist", json!(null)));
        registry.register(SectionDefinition::new("customer-account", json!(null)));

        assert_eq!(registry.names(), vec!["customer-account", "wishlist"]);
        assert!(registry.contains("wishlist"));
        assert!(!registry.contains("compare-products"));
    }

    #[test]
    fn test_definition_marker_lists_default_empty() {
        let definition: SectionDefinition = serde_json::from_str(
            r#"{"name":"wishlist","placeholder":{"likedItems":[]},"required":["wishlist"]}"#,
        )
        .unwrap();

        assert_eq!(definition.required, vec!["wishlist".to_string()]);
        assert!(definition.optional.is_empty());
    }
}
