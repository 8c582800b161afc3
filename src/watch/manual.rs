//! In-process watch source driven by explicit triggers.

use super::{EventStream, Subscription, WatchEvent, WatchSource};
use crate::error::{CacheError, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

struct Registration {
    id: u64,
    path: PathBuf,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    registrations: Vec<Registration>,
    fail_close: bool,
}

impl Registry {
    fn remove(&mut self, id: u64) {
        self.registrations.retain(|r| r.id != id);
    }
}

/// Watch source whose notifications are fired by hand.
///
/// Useful wherever file system events are too slow or too nondeterministic,
/// chiefly tests. Registration still requires the path to exist, so a cache
/// built on it fails construction exactly like one built on the real watcher.
///
/// # Examples
///
/// ```rust,no_run
/// use meshconfig_cache::watch::{ManualWatchSource, WatchSource};
/// use std::path::Path;
///
/// # fn example() -> meshconfig_cache::error::Result<()> {
/// let source = ManualWatchSource::new();
/// let mut subscription = source.register(Path::new("/etc/istio/config/mesh"))?;
/// let mut events = subscription.take_events().unwrap();
///
/// assert_eq!(source.trigger(Path::new("/etc/istio/config/mesh")), 1);
/// assert!(events.try_recv().is_ok());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ManualWatchSource {
    inner: Arc<Mutex<Registry>>,
}

impl ManualWatchSource {
    /// Create a new manual watch source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subscription report a failure when closed.
    ///
    /// The stream still ends; only the returned result changes.
    pub fn with_failing_close(self) -> Self {
        self.inner.lock().fail_close = true;
        self
    }

    /// Deliver a change notification to every open subscription for `path`.
    ///
    /// Returns the number of subscriptions notified.
    pub fn trigger(&self, path: &Path) -> usize {
        let inner = self.inner.lock();
        inner
            .registrations
            .iter()
            .filter(|r| r.path == path)
            .filter(|r| {
                r.tx
                    .send(WatchEvent {
                        path: r.path.clone(),
                    })
                    .is_ok()
            })
            .count()
    }

    /// Number of open subscriptions for `path`.
    pub fn subscription_count(&self, path: &Path) -> usize {
        self.inner
            .lock()
            .registrations
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

impl WatchSource for ManualWatchSource {
    fn register(&self, path: &Path) -> Result<Box<dyn Subscription>> {
        if !path.exists() {
            return Err(CacheError::RegistrationError {
                path: path.to_path_buf(),
                reason: "path does not exist".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.registrations.push(Registration {
            id,
            path: path.to_path_buf(),
            tx,
        });

        Ok(Box::new(ManualSubscription {
            id,
            path: path.to_path_buf(),
            events: Some(rx),
            registry: Arc::clone(&self.inner),
            closed: false,
        }))
    }
}

/// Subscription handed out by [`ManualWatchSource`].
///
/// Dropping it has the same effect on the event stream as closing it.
pub struct ManualSubscription {
    id: u64,
    path: PathBuf,
    events: Option<EventStream>,
    registry: Arc<Mutex<Registry>>,
    closed: bool,
}

impl Subscription for ManualSubscription {
    fn path(&self) -> &Path {
        &self.path
    }

    fn take_events(&mut self) -> Option<EventStream> {
        self.events.take()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut registry = self.registry.lock();
        registry.remove(self.id);
        if registry.fail_close {
            return Err(CacheError::CloseError {
                path: self.path.clone(),
                reason: "simulated close failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for ManualSubscription {
    fn drop(&mut self) {
        self.registry.lock().remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_register_missing_path() {
        let source = ManualWatchSource::new();
        let result = source.register(Path::new("/nonexistent/mesh.yaml"));
        assert!(matches!(
            result,
            Err(CacheError::RegistrationError { .. })
        ));
    }

    #[test]
    fn test_trigger_delivers_to_matching_path() {
        let file = NamedTempFile::new().unwrap();
        let other = NamedTempFile::new().unwrap();
        let source = ManualWatchSource::new();

        let mut sub = source.register(file.path()).unwrap();
        let mut events = sub.take_events().unwrap();
        assert!(sub.take_events().is_none());

        assert_eq!(source.trigger(other.path()), 0);
        assert_eq!(source.trigger(file.path()), 1);

        let event = events.try_recv().unwrap();
        assert_eq!(event.path, file.path());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_close_ends_stream() {
        let file = NamedTempFile::new().unwrap();
        let source = ManualWatchSource::new();

        let mut sub = source.register(file.path()).unwrap();
        let mut events = sub.take_events().unwrap();
        sub.close().unwrap();

        assert_eq!(source.subscription_count(file.path()), 0);
        assert_eq!(source.trigger(file.path()), 0);
        assert!(matches!(
            events.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        // Second close is a no-op
        assert!(sub.close().is_ok());
    }

    #[test]
    fn test_failing_close_still_ends_stream() {
        let file = NamedTempFile::new().unwrap();
        let source = ManualWatchSource::new().with_failing_close();

        let mut sub = source.register(file.path()).unwrap();
        let mut events = sub.take_events().unwrap();

        assert!(matches!(sub.close(), Err(CacheError::CloseError { .. })));
        assert!(matches!(
            events.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_drop_unregisters() {
        let file = NamedTempFile::new().unwrap();
        let source = ManualWatchSource::new();

        let sub = source.register(file.path()).unwrap();
        assert_eq!(source.subscription_count(file.path()), 1);
        drop(sub);
        assert_eq!(source.subscription_count(file.path()), 0);
    }
}
