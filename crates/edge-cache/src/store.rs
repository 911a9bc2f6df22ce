//! Key-value storage backends.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{CacheError, CacheResult};

/// Textual key-value store used by the cache.
///
/// Values are opaque strings; the cache owns the encoding.
pub trait KvStore: Send + Sync {
    /// Get a value. Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> CacheResult<()>;

    /// List all keys.
    fn keys(&self) -> CacheResult<Vec<String>>;
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> CacheResult<Vec<String>> {
        (**self).keys()
    }
}

/// In-memory store.
///
/// Cloning yields another handle to the same map, so several caches can share it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Store persisted as a single JSON document on disk.
///
/// The whole document is rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at `path`. A missing file opens empty.
    ///
    /// An unreadable document is discarded rather than failing the open, since
    /// the store only ever holds cache content.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "discarding unreadable store file"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> CacheResult<()> {
        let content = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        std::fs::write(&self.path, content).map_err(|source| CacheError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Namespaces every key of an underlying store with a prefix.
///
/// Keys are the plain concatenation `<prefix><key>`, with no separator. Two
/// stores are isolated only when neither prefix is a prefix of the other:
/// `"a"` with key `"bx"` and `"ab"` with key `"x"` are the same stored key.
/// Ending every prefix with a delimiter such as `-` avoids the overlap.
///
/// Empty stored strings read back as absent.
#[derive(Clone)]
pub struct PrefixedStore {
    prefix: String,
    inner: Arc<dyn KvStore>,
}

impl PrefixedStore {
    /// Wrap `inner` with `prefix`.
    pub fn new(prefix: impl Into<String>, inner: Arc<dyn KvStore>) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    /// The key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The same underlying store under a different prefix.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            inner: Arc::clone(&self.inner),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl std::fmt::Debug for PrefixedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixedStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl KvStore for PrefixedStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self
            .inner
            .get(&self.full_key(key))?
            .filter(|value| !value.is_empty()))
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.inner.set(&self.full_key(key), value)
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.delete(&self.full_key(key))
    }

    fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self
            .inner
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_delete() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("shared", "yes").unwrap();

        assert_eq!(other.get("shared").unwrap(), Some("yes".to_string()));
        other.clear();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_prefixed_store_namespaces_keys() {
        let memory = MemoryStore::new();
        let one = PrefixedStore::new("cache-one", Arc::new(memory.clone()));
        let two = one.with_prefix("another-cache");

        one.set("section", "x").unwrap();

        assert_eq!(memory.get("cache-onesection").unwrap(), Some("x".to_string()));
        assert_eq!(two.get("section").unwrap(), None);
        assert_eq!(one.keys().unwrap(), vec!["section".to_string()]);
        assert!(two.keys().unwrap().is_empty());
    }

    #[test]
    fn test_prefixed_store_overlap_needs_a_delimiter() {
        let memory: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

        // Plain concatenation: "a" + "bx" and "ab" + "x" name the same key
        let a = PrefixedStore::new("a", Arc::clone(&memory));
        let ab = PrefixedStore::new("ab", Arc::clone(&memory));
        a.set("bx", "from a").unwrap();
        assert_eq!(ab.get("x").unwrap(), Some("from a".to_string()));

        // A trailing delimiter keeps them apart
        let a = PrefixedStore::new("a-", Arc::clone(&memory));
        let ab = PrefixedStore::new("ab-", Arc::clone(&memory));
        a.set("b-x", "from a").unwrap();
        assert_eq!(ab.get("x").unwrap(), None);
    }

    #[test]
    fn test_prefixed_store_empty_value_is_absent() {
        let store = PrefixedStore::new("p-", Arc::new(MemoryStore::new()));
        store.set("empty", "").unwrap();
        assert_eq!(store.get("empty").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("section", r#"{"a":1}"#).unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("section").unwrap(), Some(r#"{"a":1}"#.to_string()));

        reopened.delete("section").unwrap();
        let again = JsonFileStore::open(&path).unwrap();
        assert_eq!(again.get("section").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_json_file_store_discards_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
