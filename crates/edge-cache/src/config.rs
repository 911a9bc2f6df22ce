//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time-to-live for cached sections, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 360;

/// Configuration for a [`crate::MarkerCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Prefix prepended to every stored key.
    #[serde(default)]
    pub prefix: String,

    /// Time-to-live for saved entries, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

impl CacheConfig {
    /// Create a config with the given prefix and the default TTL.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new("")
    }
}
