//! CLI configuration.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use edge_cache::CacheConfig;
use edge_resolver::{ResolverConfig, SectionDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File names searched for, in order, from the working directory upward.
pub const CONFIG_FILE_NAMES: [&str; 3] =
    ["edge-sections.toml", ".edge-sections.toml", "edge-sections.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Section cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Resolver configuration.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Storage backend configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Registered sections.
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,

    /// Values the fixture loader serves, keyed by section name.
    #[serde(default)]
    pub fixtures: HashMap<String, Value>,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Look up a section definition.
    pub fn section(&self, name: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Problems that make the config unusable, then ones worth a warning.
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut seen = std::collections::HashSet::new();
        for (i, section) in self.sections.iter().enumerate() {
            if section.name.is_empty() {
                errors.push(format!("sections[{}].name is required", i));
                continue;
            }
            if !seen.insert(section.name.as_str()) {
                warnings.push(format!(
                    "section '{}' is defined more than once; the last definition wins",
                    section.name
                ));
            }
            if section.required.iter().any(|m| m.is_empty())
                || section.optional.iter().any(|m| m.is_empty())
            {
                errors.push(format!("section '{}' lists an empty marker name", section.name));
            }
            if section.required.is_empty() {
                warnings.push(format!(
                    "section '{}' has no required markers and is always loaded",
                    section.name
                ));
            }
            if !self.fixtures.contains_key(&section.name) {
                warnings.push(format!("section '{}' has no fixture value", section.name));
            }
        }

        for name in self.fixtures.keys() {
            if self.section(name).is_none() {
                warnings.push(format!("fixture '{}' has no matching section", name));
            }
        }

        if self.cache.ttl_secs == 0 {
            warnings.push(
                "cache.ttl_secs is 0; entries expire right after they are saved".to_string(),
            );
        }

        errors.sort();
        warnings.sort();
        (errors, warnings)
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding cached sections. Without it the cache lives in memory
    /// for a single run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Generate a default edge-sections.toml config file.
pub fn generate_default_config() -> String {
    r#"# Edge sections configuration

[cache]
prefix = "sections-"
ttl_secs = 360

[resolver]
debounce_ms = 5
# "omit" leaves absent optional markers out of the fingerprint, "record" keeps them
absent_markers = "omit"

[store]
path = ".edge-sections/cache.json"

[[sections]]
name = "shopping-cart"
placeholder = { items = [], total = 0 }
required = ["cart"]
optional = ["currency"]

[[sections]]
name = "customer-account"
placeholder = { name = "Guest" }
required = ["customer"]

[[sections]]
name = "wishlist"
placeholder = { likedItems = [] }
required = ["wishlist"]

[fixtures]
shopping-cart = { items = ["Item 1", "Item 2"], total = 100 }
customer-account = { name = "Anonymous" }
wishlist = { likedItems = ["Nothing I like"] }
"#
    .to_string()
}
