//! File-backed configuration cache with background reloads.

use crate::core::builder::FsCacheBuilder;
use crate::core::stats::{ReloadCounters, ReloadStats};
use crate::core::Cache;
use crate::error::{CacheError, Result};
use crate::merge::ConfigMerge;
use crate::watch::{EventStream, Subscription};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[cfg(feature = "metrics")]
use crate::metrics::{CacheMetrics, FailureKind};

/// The cached value and whether it may still be replaced.
struct Cached<T> {
    current: Arc<T>,
    closed: bool,
}

/// Everything a reload needs, shared between the cache and its reload task.
pub(crate) struct Reloader<T> {
    path: PathBuf,
    defaults: Arc<T>,
    merge: Arc<dyn ConfigMerge<T>>,
    cached: Mutex<Cached<T>>,
    counters: ReloadCounters,
    #[cfg(feature = "metrics")]
    metrics: Option<CacheMetrics>,
}

impl<T> Reloader<T> {
    pub(crate) fn new(path: PathBuf, defaults: Arc<T>, merge: Arc<dyn ConfigMerge<T>>) -> Self {
        Self {
            path,
            cached: Mutex::new(Cached {
                current: Arc::clone(&defaults),
                closed: false,
            }),
            defaults,
            merge,
            counters: ReloadCounters::default(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: Option<CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    fn get(&self) -> Arc<T> {
        Arc::clone(&self.cached.lock().current)
    }

    /// Re-read the file and replace the cached value if it merges cleanly.
    ///
    /// Failures are logged and leave the cached value as it was.
    pub(crate) fn reload(&self) {
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_reload());

        let outcome = self.try_reload();

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &outcome {
                Ok(true) => metrics.record_reload_success(timer),
                Ok(false) => {}
                Err(CacheError::ReloadIoError { .. }) => {
                    metrics.record_reload_failure(timer, FailureKind::Io)
                }
                Err(_) => metrics.record_reload_failure(timer, FailureKind::Parse),
            }
        }

        match outcome {
            Ok(true) => self.counters.record_success(),
            Ok(false) => {
                debug!(
                    path = %self.path.display(),
                    "cache closed, discarding reloaded configuration"
                );
                self.counters.record_discarded();
            }
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "error loading configuration");
                self.counters.record_failure();
            }
        }
    }

    /// Returns whether the cached value was replaced.
    fn try_reload(&self) -> Result<bool> {
        let raw = std::fs::read(&self.path).map_err(|source| CacheError::ReloadIoError {
            path: self.path.clone(),
            source,
        })?;

        let candidate = self
            .merge
            .merge(&raw, &self.defaults)
            .map_err(|source| CacheError::ReloadParseError {
                path: self.path.clone(),
                source,
            })?;
        let candidate = Arc::new(candidate);

        let previous = {
            let mut cached = self.cached.lock();
            if cached.closed {
                return Ok(false);
            }
            std::mem::replace(&mut cached.current, candidate)
        };
        // The old value is released outside the lock.
        drop(previous);

        info!(path = %self.path.display(), bytes = raw.len(), "reloaded configuration");
        debug!(
            path = %self.path.display(),
            content = %String::from_utf8_lossy(&raw),
            "reloaded configuration content"
        );
        Ok(true)
    }

    fn mark_closed(&self) {
        self.cached.lock().closed = true;
    }

    fn is_closed(&self) -> bool {
        self.cached.lock().closed
    }
}

/// Reload once per notification until the stream ends.
async fn run_reload_loop<T>(reloader: Arc<Reloader<T>>, mut events: EventStream)
where
    T: Send + Sync + 'static,
{
    while let Some(event) = events.recv().await {
        debug!(path = %event.path.display(), "configuration change notification");
        reloader.reload();
    }
    debug!(path = %reloader.path.display(), "notification stream closed, reload task stopped");
}

/// A configuration cache backed by a watched file.
///
/// Holds the last successfully loaded value and refreshes it in the background
/// whenever the watch source reports a change. Reads never touch the file
/// system: [`get`](Self::get) only clones an `Arc` under a short lock, and the
/// reload task replaces that `Arc` under the same lock once a new value is fully
/// built. Readers therefore see either the old or the new value, never a mix.
///
/// A reload that cannot read or merge the file is logged and ignored, so the
/// cache keeps serving the last good value (initially, the defaults).
///
/// # Examples
///
/// ```rust,no_run
/// use meshconfig_cache::core::FsCache;
///
/// # async fn example() -> meshconfig_cache::error::Result<()> {
/// let cache = FsCache::from_file("/etc/istio/config/mesh").await?;
///
/// let mesh = cache.get();
/// println!("ingress class: {}", mesh.ingress_class);
///
/// cache.close()?;
/// # Ok(())
/// # }
/// ```
pub struct FsCache<T> {
    reloader: Arc<Reloader<T>>,
    subscription: Mutex<Option<Box<dyn Subscription>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> FsCache<T>
where
    T: Send + Sync + 'static,
{
    /// Start building a cache for `path`.
    ///
    /// `defaults` is the value served until the file is first loaded
    /// successfully, and the base `merge` layers the file contents onto.
    pub fn builder(
        path: impl Into<PathBuf>,
        defaults: Arc<T>,
        merge: impl ConfigMerge<T> + 'static,
    ) -> FsCacheBuilder<T> {
        FsCacheBuilder::new(path, defaults, merge)
    }

    /// Wire up a cache: load once, then reload on every notification.
    pub(crate) fn start(
        reloader: Arc<Reloader<T>>,
        subscription: Box<dyn Subscription>,
        events: EventStream,
    ) -> Self {
        // Best effort: a bad file at startup leaves the defaults in place.
        reloader.reload();

        let task = tokio::spawn(run_reload_loop(Arc::clone(&reloader), events));
        info!(path = %reloader.path.display(), "configuration cache started");

        Self {
            reloader,
            subscription: Mutex::new(Some(subscription)),
            task: Mutex::new(Some(task)),
        }
    }
}

impl<T> FsCache<T> {
    /// Snapshot of the current configuration.
    ///
    /// Never blocks on I/O and never fails.
    pub fn get(&self) -> Arc<T> {
        self.reloader.get()
    }

    /// Stop watching the file.
    ///
    /// Once this returns the cached value is frozen: the reload task winds down
    /// and any reload still in flight discards its result. [`get`](Self::get)
    /// keeps returning the last value. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CloseError`] if the watch could not be released
    /// cleanly. The cache is closed regardless.
    pub fn close(&self) -> Result<()> {
        self.reloader.mark_closed();

        let Some(mut subscription) = self.subscription.lock().take() else {
            return Ok(());
        };
        let result = subscription.close();
        debug!(path = %self.reloader.path.display(), "configuration cache closed");
        result
    }

    /// Wait for the background reload task to finish.
    ///
    /// The task only finishes once the notification stream has ended, so call
    /// this after [`close`](Self::close). Returns immediately if the task has
    /// already been waited for.
    pub async fn stopped(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(path = %self.reloader.path.display(), error = %err, "reload task failed");
            }
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.reloader.is_closed()
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.reloader.path
    }

    /// The value the file is merged onto.
    pub fn defaults(&self) -> &Arc<T> {
        &self.reloader.defaults
    }

    /// Reload counters since construction, including the initial load.
    pub fn stats(&self) -> ReloadStats {
        self.reloader.counters.snapshot()
    }
}

impl<T: Send + Sync> Cache<T> for FsCache<T> {
    fn get(&self) -> Arc<T> {
        FsCache::get(self)
    }
}

impl<T> Drop for FsCache<T> {
    fn drop(&mut self) {
        if self.subscription.lock().is_none() {
            return;
        }
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close configuration watch on drop");
        }
    }
}
