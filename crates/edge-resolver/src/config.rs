//! Resolver configuration.

use std::time::Duration;

use edge_markers::AbsentMarkerPolicy;
use serde::{Deserialize, Serialize};

/// Default debounce window, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 5;

/// Configuration for a [`crate::SectionResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How long loads are collected before one batch fetch is issued.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How absent optional markers enter the cache fingerprint.
    #[serde(default)]
    pub absent_markers: AbsentMarkerPolicy,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl ResolverConfig {
    /// Debounce window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            absent_markers: AbsentMarkerPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(5));
        assert_eq!(config.absent_markers, AbsentMarkerPolicy::Omit);
    }

    #[test]
    fn test_record_policy_from_text() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"absent_markers":"record","debounce_ms":20}"#).unwrap();
        assert_eq!(config.absent_markers, AbsentMarkerPolicy::Record);
        assert_eq!(config.debounce_ms, 20);
    }
}
