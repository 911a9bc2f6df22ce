//! Marker values, snapshots and fingerprints for marker-gated sections.
//!
//! This crate provides:
//! - `MarkerValue` - A cookie-like marker value (text or number)
//! - `MarkerSnapshot` - The markers observed for one request
//! - `MarkerSource` - Where marker values are read from
//! - `AbsentMarkerPolicy` - How absent optional markers enter a snapshot
//!
//! # Example
//!
//! ```ignore
//! use edge_markers::{AbsentMarkerPolicy, MarkerSnapshot, StaticMarkers};
//!
//! let markers = StaticMarkers::new().with("cart", "cart123");
//! let snapshot =
//!     MarkerSnapshot::capture(&markers, &["cart"], &["wishlist"], AbsentMarkerPolicy::Omit);
//!
//! assert!(snapshot.satisfies(&["cart"]));
//! assert_eq!(snapshot.fingerprint(), r#"{"cart":"cart123"}"#);
//! ```

mod snapshot;
mod source;
mod value;

pub use snapshot::*;
pub use source::*;
pub use value::*;
