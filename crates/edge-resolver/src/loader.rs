//! Batch loader boundary.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

/// Values returned by one batch fetch, keyed by section name.
pub type BatchValues = HashMap<String, Value>;

/// Fetches values for a list of sections in one call.
///
/// The list is ordered by first enqueue within the debounce window and holds
/// each section once. A section missing from the result fails only its own
/// waiters; an `Err` fails the whole batch.
#[async_trait]
pub trait BatchLoader: Send + Sync {
    /// Load values for `sections`.
    async fn load_batch(&self, sections: &[String]) -> anyhow::Result<BatchValues>;
}

#[async_trait]
impl<L: BatchLoader + ?Sized> BatchLoader for Arc<L> {
    async fn load_batch(&self, sections: &[String]) -> anyhow::Result<BatchValues> {
        (**self).load_batch(sections).await
    }
}

/// Adapts an async closure into a [`BatchLoader`].
///
/// ```ignore
/// let loader = FnLoader::new(|sections: Vec<String>| async move {
///     fetch_sections(&sections).await
/// });
/// ```
pub struct FnLoader<F> {
    load: F,
}

impl<F> FnLoader<F> {
    /// Wrap `load`.
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

#[async_trait]
impl<F, Fut> BatchLoader for FnLoader<F>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<BatchValues>> + Send + 'static,
{
    async fn load_batch(&self, sections: &[String]) -> anyhow::Result<BatchValues> {
        (self.load)(sections.to_vec()).await
    }
}

/// Serves sections from a fixed set of values and records every call.
///
/// Sections without a fixture are left out of the result.
#[derive(Debug, Default)]
pub struct StaticLoader {
    values: HashMap<String, Value>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StaticLoader {
    /// Create a loader with no fixtures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader serving `values`.
    pub fn from_values(values: HashMap<String, Value>) -> Self {
        Self {
            values,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a fixture.
    pub fn with(mut self, section: impl Into<String>, value: Value) -> Self {
        self.values.insert(section.into(), value);
        self
    }

    /// Every batch requested so far, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of batches requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every section requested so far, flattened in call order.
    pub fn loaded_sections(&self) -> Vec<String> {
        self.calls().into_iter().flatten().collect()
    }
}

#[async_trait]
impl BatchLoader for StaticLoader {
    async fn load_batch(&self, sections: &[String]) -> anyhow::Result<BatchValues> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sections.to_vec());

        Ok(sections
            .iter()
            .filter_map(|section| {
                self.values
                    .get(section)
                    .map(|value| (section.clone(), value.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_loader_serves_and_records() {
        let loader =
            StaticLoader::new().with("wishlist", json!({"likedItems": ["Nothing I like"]}));

        let values = loader
            .load_batch(&["wishlist".to_string(), "compare-products".to_string()])
            .await
            .unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values["wishlist"], json!({"likedItems": ["Nothing I like"]}));
        assert_eq!(
            loader.calls(),
            vec![vec!["wishlist".to_string(), "compare-products".to_string()]]
        );
        assert_eq!(loader.loaded_sections().len(), 2);
    }

    #[tokio::test]
    async fn test_fn_loader() {
        let loader = FnLoader::new(|sections: Vec<String>| async move {
            Ok::<_, anyhow::Error>(
                sections
                    .into_iter()
                    .map(|s| {
                        let value = json!(s.len());
                        (s, value)
                    })
                    .collect::<BatchValues>(),
            )
        });

        let values = loader.load_batch(&["abc".to_string()]).await.unwrap();
        assert_eq!(values["abc"], json!(3));
    }

    #[tokio::test]
    async fn test_arc_loader_delegates() {
        let loader = Arc::new(StaticLoader::new().with("a", json!(1)));
        let shared: Arc<dyn BatchLoader> = loader.clone();

        shared.load_batch(&["a".to_string()]).await.unwrap();
        assert_eq!(loader.call_count(), 1);
    }
}
