//! Section resolver with debounced batch loading.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use edge_cache::{CacheLookup, MarkerCache, MemoryStore};
use edge_markers::{AbsentMarkerPolicy, MarkerSnapshot, MarkerSource};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::config::{ResolverConfig, DEFAULT_DEBOUNCE_MS};
use crate::error::{ResolverError, ResolverResult};
use crate::loader::{BatchLoader, BatchValues};
use crate::registry::{SectionDefinition, SectionRegistry};
use crate::scheduler::{batch_sections, Claim, Enqueued, PendingBatch, Waiter};

/// Which path produced a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStatus {
    /// Required markers were absent.
    Placeholder,
    /// Served from the cache.
    Cached,
    /// Fetched through the batch loader.
    Loaded,
}

impl fmt::Display for ResolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => write!(f, "PLACEHOLDER"),
            Self::Cached => write!(f, "CACHED"),
            Self::Loaded => write!(f, "LOADED"),
        }
    }
}

/// A resolved section value and how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The value.
    pub value: Value,
    /// Where it came from.
    pub status: ResolveStatus,
}

impl Resolution {
    fn new(value: Value, status: ResolveStatus) -> Self {
        Self { value, status }
    }
}

/// Resolves registered sections to placeholder, cached or freshly loaded values.
///
/// Loads issued within one debounce window share a single call to the batch
/// loader. The loader sees each section name once, in first-enqueue order, even
/// when several callers asked for it; every caller still gets its own reply and
/// its own cache write. Cloning gives another handle to the same resolver.
#[derive(Clone)]
pub struct SectionResolver {
    inner: Arc<Inner>,
}

struct Inner {
    registry: RwLock<SectionRegistry>,
    markers: Box<dyn MarkerSource>,
    loader: Box<dyn BatchLoader>,
    cache: MarkerCache,
    batch: Mutex<PendingBatch>,
    debounce: Duration,
    absent_markers: AbsentMarkerPolicy,
}

impl SectionResolver {
    /// Start building a resolver around a batch loader and a marker source.
    pub fn builder(
        loader: impl BatchLoader + 'static,
        markers: impl MarkerSource + 'static,
    ) -> ResolverBuilder {
        ResolverBuilder {
            loader: Box::new(loader),
            markers: Box::new(markers),
            cache: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            absent_markers: AbsentMarkerPolicy::default(),
        }
    }

    /// Register a section, replacing any previous definition of the same name.
    pub fn add(&self, section: &str, placeholder: Value, required: &[&str], optional: &[&str]) {
        let definition = SectionDefinition {
            name: section.to_string(),
            placeholder,
            required: required.iter().map(|s| s.to_string()).collect(),
            optional: optional.iter().map(|s| s.to_string()).collect(),
        };
        self.register(definition);
    }

    /// Register a section definition, replacing any previous one.
    pub fn register(&self, definition: SectionDefinition) {
        let name = definition.name.clone();
        let replaced = self
            .inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(definition)
            .is_some();

        tracing::debug!(section = %name, replaced, "registered section");
    }

    /// Check if a section is registered.
    pub fn is_registered(&self, section: &str) -> bool {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(section)
    }

    /// Resolve a section to its value.
    pub async fn load(&self, section: &str) -> ResolverResult<Value> {
        self.resolve(section).await.map(|resolution| resolution.value)
    }

    /// Resolve several sections concurrently so they share one batch.
    ///
    /// Results are in the order of `sections`.
    pub async fn load_many(&self, sections: &[&str]) -> Vec<ResolverResult<Value>> {
        join_all(sections.iter().map(|section| self.load(section))).await
    }

    /// Resolve a section, reporting which path produced the value.
    ///
    /// Loading an unregistered section is an error, not a placeholder.
    pub async fn resolve(&self, section: &str) -> ResolverResult<Resolution> {
        let Some(definition) = self.definition(section) else {
            tracing::error!(section, "load requested for unregistered section");
            return Err(ResolverError::UnknownSection(section.to_string()));
        };

        let markers = MarkerSnapshot::capture(
            self.inner.markers.as_ref(),
            &definition.required,
            &definition.optional,
            self.inner.absent_markers,
        );

        if !markers.satisfies(&definition.required) {
            tracing::debug!(
                section,
                missing = ?markers.missing(&definition.required),
                "required markers absent, serving placeholder"
            );
            return Ok(Resolution::new(definition.placeholder, ResolveStatus::Placeholder));
        }

        match self.inner.cache.lookup::<Value>(section, &markers)? {
            CacheLookup::Hit(value) => {
                tracing::debug!(section, markers = %markers, "cache hit");
                return Ok(Resolution::new(value, ResolveStatus::Cached));
            }
            miss => {
                tracing::debug!(section, markers = %markers, reason = miss.label(), "cache miss");
            }
        }

        let reply = self.enqueue(section, markers);
        let value = reply
            .await
            .map_err(|_| ResolverError::Cancelled(section.to_string()))??;

        Ok(Resolution::new(value, ResolveStatus::Loaded))
    }

    /// Dispatch the pending batch now instead of waiting for its timer.
    ///
    /// Returns once the batch has settled. Does nothing if no batch is armed.
    pub async fn flush(&self) {
        let claimed = self.inner.lock_batch().claim(Claim::Manual);
        if let Some(waiters) = claimed {
            self.inner.dispatch(waiters).await;
        }
    }

    /// Number of callers waiting on the armed batch.
    pub fn pending(&self) -> usize {
        self.inner.lock_batch().len()
    }

    /// The cache backing this resolver.
    pub fn cache(&self) -> &MarkerCache {
        &self.inner.cache
    }

    /// The debounce window.
    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    fn definition(&self, section: &str) -> Option<SectionDefinition> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(section)
            .cloned()
    }

    fn enqueue(
        &self,
        section: &str,
        markers: MarkerSnapshot,
    ) -> oneshot::Receiver<ResolverResult<Value>> {
        let (reply, rx) = oneshot::channel();
        let waiter = Waiter {
            section: section.to_string(),
            markers,
            reply,
        };

        let mut batch = self.inner.lock_batch();
        match batch.enqueue(waiter) {
            Enqueued::Armed(generation) => {
                let inner = Arc::clone(&self.inner);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(inner.debounce).await;
                    let claimed = inner.lock_batch().claim(Claim::Timer(generation));
                    if let Some(waiters) = claimed {
                        inner.dispatch(waiters).await;
                    }
                });
                batch.set_timer(generation, handle);
                tracing::debug!(section, generation, "armed section batch");
            }
            Enqueued::Joined => {
                tracing::debug!(section, pending = batch.len(), "joined section batch");
            }
        }

        rx
    }
}

impl fmt::Debug for SectionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionResolver")
            .field("cache", &self.inner.cache)
            .field("debounce", &self.inner.debounce)
            .field("absent_markers", &self.inner.absent_markers)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn lock_batch(&self) -> MutexGuard<'_, PendingBatch> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a claimed batch and settle every waiter.
    async fn dispatch(&self, waiters: Vec<Waiter>) {
        let sections = batch_sections(&waiters);
        tracing::info!(
            waiters = waiters.len(),
            sections = ?sections,
            "dispatching section batch"
        );

        match self.loader.load_batch(&sections).await {
            Ok(values) => self.settle(waiters, &values),
            Err(e) => {
                let cause = Arc::new(e);
                tracing::warn!(
                    sections = ?sections,
                    error = %format!("{:#}", cause),
                    "batch loader failed"
                );
                for waiter in waiters {
                    let _ = waiter.reply.send(Err(ResolverError::Loader(Arc::clone(&cause))));
                }
            }
        }
    }

    fn settle(&self, waiters: Vec<Waiter>, values: &BatchValues) {
        for waiter in waiters {
            let Some(value) = values.get(&waiter.section) else {
                tracing::warn!(section = %waiter.section, "batch loader returned no value");
                let _ = waiter
                    .reply
                    .send(Err(ResolverError::MissingSection(waiter.section)));
                continue;
            };

            if let Err(e) = self.cache.save(&waiter.section, value, &waiter.markers) {
                tracing::warn!(section = %waiter.section, error = %e, "failed to cache section");
            }

            // The caller may have stopped waiting
            let _ = waiter.reply.send(Ok(value.clone()));
        }
    }
}

/// Builder for [`SectionResolver`].
pub struct ResolverBuilder {
    loader: Box<dyn BatchLoader>,
    markers: Box<dyn MarkerSource>,
    cache: Option<MarkerCache>,
    debounce: Duration,
    absent_markers: AbsentMarkerPolicy,
}

impl ResolverBuilder {
    /// Use `cache` instead of a private in-memory cache.
    pub fn cache(mut self, cache: MarkerCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the debounce window.
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set how absent optional markers enter snapshots.
    pub fn absent_markers(mut self, policy: AbsentMarkerPolicy) -> Self {
        self.absent_markers = policy;
        self
    }

    /// Apply a [`ResolverConfig`].
    pub fn config(self, config: &ResolverConfig) -> Self {
        self.debounce(config.debounce())
            .absent_markers(config.absent_markers)
    }

    /// Build the resolver.
    pub fn build(self) -> SectionResolver {
        SectionResolver {
            inner: Arc::new(Inner {
                registry: RwLock::new(SectionRegistry::new()),
                markers: self.markers,
                loader: self.loader,
                cache: self
                    .cache
                    .unwrap_or_else(|| MarkerCache::new(MemoryStore::new())),
                batch: Mutex::new(PendingBatch::new()),
                debounce: self.debounce,
                absent_markers: self.absent_markers,
            }),
        }
    }
}
