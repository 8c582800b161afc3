//! Core cache types.

mod builder;
mod cache;
mod fs_cache;
mod stats;
mod validation;

pub use builder::FsCacheBuilder;
pub use cache::{Cache, StaticCache};
pub use fs_cache::FsCache;
pub use stats::ReloadStats;
pub use validation::Validate;

#[cfg(feature = "file-watch")]
use crate::error::Result;
#[cfg(feature = "file-watch")]
use crate::mesh::{MeshConfig, default_mesh_config};
#[cfg(feature = "file-watch")]
use std::path::Path;

#[cfg(feature = "file-watch")]
impl FsCache<MeshConfig> {
    /// Cache the mesh configuration stored at `path`.
    ///
    /// Uses the process-wide [`default_mesh_config`], the merge from
    /// [`MeshConfig::merger_for`] and the file system watcher. Must be called
    /// from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::RegistrationError`](crate::error::CacheError::RegistrationError)
    /// if `path` does not exist or cannot be watched. An unreadable or invalid
    /// file is not an error; the cache then starts with the defaults.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        FsCache::builder(path, default_mesh_config(), MeshConfig::merger_for(path))
            .build()
            .await
    }
}
