//! Marker-gated section cache.

use std::sync::Arc;
use std::time::Duration;

use edge_markers::MarkerSnapshot;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, DEFAULT_TTL_SECS};
use crate::entry::{metadata_key, CacheLookup, CacheMetadata};
use crate::error::CacheResult;
use crate::store::{KvStore, PrefixedStore};

/// Section cache whose entries are only valid for the exact markers they were
/// loaded with, and only until their TTL runs out.
///
/// The payload is stored under `<prefix><section>` and its metadata under
/// `<prefix><section>-meta`, both as JSON text.
#[derive(Clone)]
pub struct MarkerCache {
    store: PrefixedStore,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MarkerCache {
    /// Create a cache over `store` with no prefix and the default TTL.
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self::shared(Arc::new(store))
    }

    /// Create a cache over a shared store handle.
    pub fn shared(store: Arc<dyn KvStore>) -> Self {
        Self {
            store: PrefixedStore::new("", store),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(store: Arc<dyn KvStore>, config: &CacheConfig) -> Self {
        Self::shared(store)
            .with_prefix(config.prefix.clone())
            .with_ttl(config.ttl())
    }

    /// Set the key prefix.
    ///
    /// Caches sharing a store stay apart only if neither prefix starts with the
    /// other; see [`PrefixedStore`].
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.store = self.store.with_prefix(prefix);
        self
    }

    /// Set the time-to-live of saved entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the clock used for expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The key prefix.
    pub fn prefix(&self) -> &str {
        self.store.prefix()
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Save `payload` for `section`, stamped with `markers` and an expiry of now + TTL.
    ///
    /// Overwrites any previous entry for the section. The old metadata is removed
    /// before the payload is replaced, so a failure part way through leaves a
    /// miss rather than a new payload under old markers.
    pub fn save<T>(&self, section: &str, payload: &T, markers: &MarkerSnapshot) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        let metadata = CacheMetadata::new(
            markers.clone(),
            self.clock.now_millis(),
            self.ttl.as_millis() as u64,
        );

        let payload = serde_json::to_string(payload)?;
        let encoded = serde_json::to_string(&metadata)?;
        let meta_key = metadata_key(section);

        self.store.delete(&meta_key)?;
        self.store.set(section, &payload)?;
        self.store.set(&meta_key, &encoded)?;

        tracing::debug!(
            section,
            markers = %markers,
            expire_at = metadata.expire_at,
            "cached section"
        );

        Ok(())
    }

    /// Load the payload for `section` if it was saved with exactly `markers` and
    /// has not expired.
    pub fn load<T: DeserializeOwned>(
        &self,
        section: &str,
        markers: &MarkerSnapshot,
    ) -> CacheResult<Option<T>> {
        Ok(self.lookup(section, markers)?.into_hit())
    }

    /// Like [`MarkerCache::load`], but reports why a lookup missed.
    ///
    /// Only store failures are errors; undecodable content is `Corrupt`.
    pub fn lookup<T: DeserializeOwned>(
        &self,
        section: &str,
        markers: &MarkerSnapshot,
    ) -> CacheResult<CacheLookup<T>> {
        let metadata = match self.read_metadata(section)? {
            StoredMetadata::Valid(metadata) => metadata,
            StoredMetadata::Corrupt => return Ok(CacheLookup::Corrupt),
            StoredMetadata::Missing => return Ok(CacheLookup::Miss),
        };

        if !metadata.markers.is_same(markers) {
            return Ok(CacheLookup::MarkersChanged);
        }

        if metadata.is_expired(self.clock.now_millis()) {
            return Ok(CacheLookup::Expired);
        }

        let Some(raw) = self.store.get(section)? else {
            return Ok(CacheLookup::Miss);
        };

        Ok(match serde_json::from_str(&raw) {
            Ok(payload) => CacheLookup::Hit(payload),
            Err(e) => {
                tracing::debug!(section, error = %e, "stored payload is unreadable");
                CacheLookup::Corrupt
            }
        })
    }

    /// Stored metadata for `section`, if present and readable.
    pub fn metadata(&self, section: &str) -> CacheResult<Option<CacheMetadata>> {
        Ok(match self.read_metadata(section)? {
            StoredMetadata::Valid(metadata) => Some(metadata),
            StoredMetadata::Corrupt | StoredMetadata::Missing => None,
        })
    }

    /// Remove the payload and metadata for `section`.
    pub fn evict(&self, section: &str) -> CacheResult<()> {
        self.store.delete(&metadata_key(section))?;
        self.store.delete(section)
    }

    /// Current time according to the cache clock, in unix milliseconds.
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    fn read_metadata(&self, section: &str) -> CacheResult<StoredMetadata> {
        let Some(raw) = self.store.get(&metadata_key(section))? else {
            return Ok(StoredMetadata::Missing);
        };

        Ok(match serde_json::from_str(&raw) {
            Ok(metadata) => StoredMetadata::Valid(metadata),
            Err(e) => {
                tracing::debug!(section, error = %e, "stored metadata is unreadable");
                StoredMetadata::Corrupt
            }
        })
    }
}

/// What the metadata key of a section holds.
enum StoredMetadata {
    Missing,
    Corrupt,
    Valid(CacheMetadata),
}

impl std::fmt::Debug for MarkerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerCache")
            .field("prefix", &self.store.prefix())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
