//! Resolver error types.

use std::sync::Arc;

use edge_cache::CacheError;

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors surfaced by [`crate::SectionResolver::load`].
///
/// Missing markers and cache misses are not errors; they resolve to the
/// placeholder or to a fresh load.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The section was never registered.
    #[error("section `{0}` is not registered")]
    UnknownSection(String),

    /// The batch loader failed; every waiter of that batch shares the cause.
    #[error("batch loader failed: {0:#}")]
    Loader(Arc<anyhow::Error>),

    /// The batch loader returned no value for the section.
    #[error("batch loader returned no value for section `{0}`")]
    MissingSection(String),

    /// The cache store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The pending batch was dropped before it settled.
    #[error("section `{0}` was dropped before its batch settled")]
    Cancelled(String),
}
