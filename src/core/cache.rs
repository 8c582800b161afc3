//! The read side of a configuration cache.

use std::sync::Arc;

/// Read access to a current configuration value.
///
/// Implementations never block on I/O and never fail; the worst a caller can
/// see is a stale or default value. Code that only reads configuration should
/// depend on this trait so a [`StaticCache`] can stand in for the file-backed
/// [`FsCache`](crate::core::FsCache) in tests.
pub trait Cache<T>: Send + Sync {
    /// Snapshot of the current configuration.
    fn get(&self) -> Arc<T>;
}

/// A cache holding one fixed value.
///
/// # Examples
///
/// ```rust
/// use meshconfig_cache::core::{Cache, StaticCache};
/// use meshconfig_cache::mesh::MeshConfig;
///
/// let cache = StaticCache::new(MeshConfig::default());
/// assert_eq!(cache.get().proxy_listen_port, 15001);
/// ```
#[derive(Debug)]
pub struct StaticCache<T> {
    value: Arc<T>,
}

impl<T> StaticCache<T> {
    /// Create a cache that always returns `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// Create a cache sharing an existing snapshot.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self { value }
    }
}

impl<T> Clone for StaticCache<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: Send + Sync> Cache<T> for StaticCache<T> {
    fn get(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }
}
