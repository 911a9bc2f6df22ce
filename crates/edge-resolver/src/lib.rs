//! Marker-gated section resolution with debounced batch loading.
//!
//! This crate provides:
//! - `SectionResolver` - Resolves sections to placeholder, cached or loaded values
//! - `SectionDefinition` / `SectionRegistry` - Registered sections and their markers
//! - `BatchLoader` - The fetch boundary, called once per debounce window
//! - `ResolverConfig` - Debounce window and marker policy
//!
//! # Example
//!
//! ```ignore
//! use edge_markers::StaticMarkers;
//! use edge_resolver::{SectionResolver, StaticLoader};
//! use serde_json::json;
//!
//! let loader = StaticLoader::new()
//!     .with("shopping-cart", json!({"items": ["Item 1", "Item 2"], "total": 100}));
//! let markers = StaticMarkers::new().with("cart", "cart123");
//!
//! let resolver = SectionResolver::builder(loader, markers).build();
//! resolver.add("shopping-cart", json!({"items": [], "total": 0}), &["cart"], &[]);
//!
//! let cart = resolver.load("shopping-cart").await?;
//! ```

mod config;
mod error;
mod loader;
mod registry;
mod resolver;
mod scheduler;

pub use config::*;
pub use error::*;
pub use loader::*;
pub use registry::*;
pub use resolver::*;
