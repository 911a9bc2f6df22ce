//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use edge_cache::{JsonFileStore, KvStore, MarkerCache, MemoryStore};

use crate::config::{CliConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    /// Config file the configuration came from, if any.
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            let path = resolve_against(&cwd, path);
            (CliConfig::load(&path)?, Some(path))
        } else {
            // Try to find config in current directory or parent directories
            match find_config(&cwd) {
                Some(path) => (CliConfig::load(&path)?, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        if let Some(ref path) = config_path {
            output.debug(&format!("Using config: {}", path.display()));
        }

        Ok(Self {
            config,
            output,
            cwd,
            config_path,
        })
    }

    /// Directory relative store paths are resolved against: the config file's
    /// directory, or the working directory without one.
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(self.cwd.as_path())
    }

    /// Open the configured store.
    pub fn open_store(&self) -> Result<Arc<dyn KvStore>> {
        match self.config.store.path {
            Some(ref path) => {
                let path = resolve_against(self.base_dir(), path);
                self.output
                    .debug(&format!("Using store file: {}", path.display()));
                let store = JsonFileStore::open(&path)
                    .with_context(|| format!("Failed to open store: {}", path.display()))?;
                Ok(Arc::new(store))
            }
            None => {
                self.output.debug("Using in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Open the section cache over the configured store.
    pub fn open_cache(&self) -> Result<MarkerCache> {
        let store = self.open_store()?;
        Ok(MarkerCache::from_config(store, &self.config.cache))
    }
}

/// Find the nearest config file from `start` upward.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".edge-sections.toml"), "").unwrap();
        let nested = dir.path().join("storefront").join("pages");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(".edge-sections.toml"));
    }

    #[test]
    fn test_find_config_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("edge-sections.json"), "{}").unwrap();
        std::fs::write(dir.path().join("edge-sections.toml"), "").unwrap();

        let found = find_config(dir.path()).unwrap();
        assert_eq!(found, dir.path().join("edge-sections.toml"));
    }

    #[test]
    fn test_store_path_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: CliConfig::default(),
            output: Output::new(false, true),
            cwd: PathBuf::from("/"),
            config_path: Some(dir.path().join("edge-sections.toml")),
        };

        assert_eq!(ctx.base_dir(), dir.path());
        assert_eq!(
            resolve_against(ctx.base_dir(), "cache.json"),
            dir.path().join("cache.json")
        );
        assert_eq!(
            resolve_against(ctx.base_dir(), "/tmp/cache.json"),
            PathBuf::from("/tmp/cache.json")
        );
    }

    #[test]
    fn test_file_store_persists_between_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CliConfig::default();
        config.store.path = Some("cache/sections.json".to_string());

        let ctx = Context {
            config,
            output: Output::new(false, true),
            cwd: dir.path().to_path_buf(),
            config_path: None,
        };

        ctx.open_store().unwrap().set("wishlist", "[]").unwrap();

        let reopened = ctx.open_store().unwrap();
        assert_eq!(reopened.get("wishlist").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("cache/sections.json").exists());
    }
}
