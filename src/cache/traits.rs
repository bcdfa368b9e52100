//! Unified cache trait for coordinated invalidation

use std::path::Path;

/// Common interface for cache layers
///
/// Lets a caller that knows which files changed drop stale entries without
/// knowing how a particular layer stores them.
pub trait CacheLayer: Send + Sync {
    /// Name of this cache layer (for logging)
    fn name(&self) -> &str;

    /// Check if this cache has any data
    fn is_populated(&self) -> bool;

    /// Invalidate cache entries for the given files
    fn invalidate_files(&self, changed_files: &[&Path]);

    /// Invalidate all cached data
    fn invalidate_all(&self);
}
