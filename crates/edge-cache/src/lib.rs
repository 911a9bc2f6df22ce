//! Marker-gated section cache.
//!
//! This crate provides:
//! - `MarkerCache` - Section payload cache validated by marker snapshot and TTL
//! - `KvStore` - Textual key-value storage boundary
//! - `MemoryStore` / `JsonFileStore` - Storage backends
//! - `PrefixedStore` - Key namespacing so caches can share one store
//! - `Clock` - Time source used for expiry
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use edge_cache::{MarkerCache, MemoryStore};
//! use edge_markers::MarkerSnapshot;
//!
//! let cache = MarkerCache::new(MemoryStore::new())
//!     .with_prefix("sections-")
//!     .with_ttl(Duration::from_secs(360));
//!
//! let markers = MarkerSnapshot::new().with("cart", "cart123");
//! cache.save("shopping-cart", &serde_json::json!({"total": 100}), &markers)?;
//!
//! let cart: Option<serde_json::Value> = cache.load("shopping-cart", &markers)?;
//! ```

mod cache;
mod clock;
mod config;
mod entry;
mod error;
mod store;

pub use cache::*;
pub use clock::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use store::*;
