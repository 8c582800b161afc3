//! Builder for constructing FsCache instances.

use crate::core::FsCache;
use crate::core::fs_cache::Reloader;
use crate::error::{CacheError, Result};
use crate::merge::ConfigMerge;
use crate::watch::WatchSource;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "file-watch")]
use crate::watch::NotifyWatchSource;

#[cfg(feature = "metrics")]
use crate::metrics::CacheMetrics;

/// Builder for constructing an [`FsCache`].
///
/// The path, default value and merge collaborator are required up front; the
/// watch source defaults to a [`NotifyWatchSource`](crate::watch::NotifyWatchSource)
/// when the `file-watch` feature is enabled.
///
/// # Examples
///
/// ```rust,no_run
/// use meshconfig_cache::core::FsCache;
/// use meshconfig_cache::mesh::{MeshConfig, default_mesh_config};
/// use meshconfig_cache::watch::NotifyWatchSource;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> meshconfig_cache::error::Result<()> {
/// let path = Path::new("/etc/istio/config/mesh");
/// let cache = FsCache::builder(path, default_mesh_config(), MeshConfig::merger_for(path))
///     .with_watch_source(NotifyWatchSource::new().with_debounce(Duration::from_millis(100)))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct FsCacheBuilder<T> {
    path: PathBuf,
    defaults: Arc<T>,
    merge: Arc<dyn ConfigMerge<T>>,
    watch_source: Option<Box<dyn WatchSource>>,
    #[cfg(feature = "metrics")]
    metrics: Option<CacheMetrics>,
}

impl<T> FsCacheBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new builder.
    pub fn new(
        path: impl Into<PathBuf>,
        defaults: Arc<T>,
        merge: impl ConfigMerge<T> + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            defaults,
            merge: Arc::new(merge),
            watch_source: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Use a specific watch source instead of the file system watcher.
    pub fn with_watch_source<W: WatchSource + 'static>(mut self, source: W) -> Self {
        self.watch_source = Some(Box::new(source));
        self
    }

    /// Record reload metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: CacheMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the cache.
    ///
    /// Registers the path with the watch source, performs one load and starts
    /// the background reload task on the current Tokio runtime. A file that
    /// cannot be read or merged at this point is logged and the cache starts
    /// out with the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::RegistrationError`] if the path cannot be watched,
    /// which includes the file not existing. No cache is created in that case.
    pub async fn build(self) -> Result<FsCache<T>> {
        let source = match self.watch_source {
            Some(source) => source,
            None => default_watch_source(&self.path)?,
        };

        let mut subscription = source.register(&self.path)?;
        let events = subscription
            .take_events()
            .ok_or_else(|| CacheError::RegistrationError {
                path: self.path.clone(),
                reason: "subscription has no event stream".to_string(),
            })?;

        let reloader = Reloader::new(self.path, self.defaults, self.merge);
        #[cfg(feature = "metrics")]
        let reloader = reloader.with_metrics(self.metrics);

        Ok(FsCache::start(Arc::new(reloader), subscription, events))
    }
}

#[cfg(feature = "file-watch")]
fn default_watch_source(_path: &std::path::Path) -> Result<Box<dyn WatchSource>> {
    Ok(Box::new(NotifyWatchSource::new()))
}

#[cfg(not(feature = "file-watch"))]
fn default_watch_source(path: &std::path::Path) -> Result<Box<dyn WatchSource>> {
    Err(CacheError::RegistrationError {
        path: path.to_path_buf(),
        reason: "no watch source configured and the `file-watch` feature is disabled"
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use crate::watch::{EventStream, ManualWatchSource, Subscription};
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn keep_defaults(_raw: &[u8], defaults: &u32) -> std::result::Result<u32, MergeError> {
        Ok(*defaults)
    }

    /// A watch source whose subscriptions never hand out a stream.
    struct Streamless;

    struct StreamlessSubscription(PathBuf);

    impl Subscription for StreamlessSubscription {
        fn path(&self) -> &Path {
            &self.0
        }

        fn take_events(&mut self) -> Option<EventStream> {
            None
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl WatchSource for Streamless {
        fn register(&self, path: &Path) -> Result<Box<dyn Subscription>> {
            Ok(Box::new(StreamlessSubscription(path.to_path_buf())))
        }
    }

    #[tokio::test]
    async fn test_build_with_manual_source() {
        let file = NamedTempFile::new().unwrap();
        let cache = FsCacheBuilder::new(file.path(), Arc::new(5u32), keep_defaults)
            .with_watch_source(ManualWatchSource::new())
            .build()
            .await
            .unwrap();

        assert_eq!(*cache.get(), 5);
        assert_eq!(cache.path(), file.path());
    }

    #[tokio::test]
    async fn test_build_requires_event_stream() {
        let file = NamedTempFile::new().unwrap();
        let result = FsCacheBuilder::new(file.path(), Arc::new(5u32), keep_defaults)
            .with_watch_source(Streamless)
            .build()
            .await;

        assert!(matches!(result, Err(CacheError::RegistrationError { .. })));
    }
}
