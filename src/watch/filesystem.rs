//! File system watch source backed by the `notify` crate.

use super::{EventStream, Subscription, WatchEvent, WatchSource};
use crate::error::{CacheError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Watch source that observes the file system.
///
/// The parent directory of the watched file is watched rather than the file
/// itself, so replacing the file by rename or swapping a symlink (how mounted
/// ConfigMaps are updated) is still observed. Every directory event triggers a
/// re-hash of the file and a notification is only emitted when the content
/// hash changed, including the file disappearing or reappearing.
///
/// Registration must happen inside a Tokio runtime; each subscription runs a
/// small forwarding task on it.
///
/// # Examples
///
/// ```rust,no_run
/// use meshconfig_cache::watch::{NotifyWatchSource, WatchSource};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> meshconfig_cache::error::Result<()> {
/// let source = NotifyWatchSource::new().with_debounce(Duration::from_millis(100));
/// let mut subscription = source.register(Path::new("/etc/istio/config/mesh"))?;
/// let mut events = subscription.take_events().unwrap();
///
/// while let Some(event) = events.recv().await {
///     println!("{} changed", event.path.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NotifyWatchSource {
    debounce: Duration,
}

impl NotifyWatchSource {
    /// Create a watch source without debouncing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long after a change before re-hashing, folding any further
    /// changes in that window into the same check.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The configured debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl WatchSource for NotifyWatchSource {
    fn register(&self, path: &Path) -> Result<Box<dyn Subscription>> {
        let registration_error = |reason: String| CacheError::RegistrationError {
            path: path.to_path_buf(),
            reason,
        };

        // The target must exist now, even though later changes are tracked
        // through the parent directory.
        path.canonicalize()
            .map_err(|e| registration_error(format!("Failed to resolve path: {}", e)))?;

        let absolute = std::path::absolute(path)
            .map_err(|e| registration_error(format!("Failed to resolve path: {}", e)))?;
        let dir = absolute
            .parent()
            .ok_or_else(|| registration_error("path has no parent directory".to_string()))?
            .to_path_buf();

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| registration_error(format!("No Tokio runtime available: {}", e)))?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<()>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(_) => {
                    let _ = raw_tx.send(());
                }
                Err(e) => warn!(error = %e, "file watcher error"),
            }
        })
        .map_err(|e| registration_error(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| registration_error(format!("Failed to watch directory: {}", e)))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let forwarder = Forwarder {
            path: path.to_path_buf(),
            file: absolute,
            debounce: self.debounce,
            last_hash: hash_file(path),
        };
        runtime.spawn(forwarder.run(raw_rx, events_tx, shutdown_rx));

        debug!(path = %path.display(), dir = %dir.display(), "watching configuration file");

        Ok(Box::new(NotifySubscription {
            path: path.to_path_buf(),
            dir,
            watcher: Some(watcher),
            shutdown: Some(shutdown_tx),
            events: Some(events_rx),
        }))
    }
}

/// Turns raw directory events into content-change notifications.
struct Forwarder {
    path: PathBuf,
    file: PathBuf,
    debounce: Duration,
    last_hash: Option<Vec<u8>>,
}

impl Forwarder {
    async fn run(
        mut self,
        mut raw_rx: mpsc::UnboundedReceiver<()>,
        events_tx: mpsc::UnboundedSender<WatchEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                msg = raw_rx.recv() => {
                    if msg.is_none() {
                        break;
                    }
                }
            }

            if !self.debounce.is_zero() {
                let window = sleep(self.debounce);
                tokio::pin!(window);
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => return,
                        _ = &mut window => break,
                        msg = raw_rx.recv() => {
                            if msg.is_none() {
                                return;
                            }
                        }
                    }
                }
            }

            let hash = hash_file(&self.file);
            if hash == self.last_hash {
                continue;
            }
            self.last_hash = hash;

            debug!(path = %self.path.display(), "configuration file content changed");
            if events_tx
                .send(WatchEvent {
                    path: self.path.clone(),
                })
                .is_err()
            {
                break;
            }
        }
        debug!(path = %self.path.display(), "file watch forwarding stopped");
    }
}

/// SHA-256 of the file content, `None` when it cannot be read.
fn hash_file(path: &Path) -> Option<Vec<u8>> {
    std::fs::read(path)
        .ok()
        .map(|bytes| Sha256::digest(&bytes).to_vec())
}

/// Subscription handed out by [`NotifyWatchSource`].
pub struct NotifySubscription {
    path: PathBuf,
    dir: PathBuf,
    watcher: Option<RecommendedWatcher>,
    shutdown: Option<oneshot::Sender<()>>,
    events: Option<EventStream>,
}

impl Subscription for NotifySubscription {
    fn path(&self) -> &Path {
        &self.path
    }

    fn take_events(&mut self) -> Option<EventStream> {
        self.events.take()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let Some(mut watcher) = self.watcher.take() else {
            return Ok(());
        };

        watcher
            .unwatch(&self.dir)
            .map_err(|e| CacheError::CloseError {
                path: self.path.clone(),
                reason: format!("Failed to unwatch {}: {}", self.dir.display(), e),
            })
    }
}

impl Drop for NotifySubscription {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_register_nonexistent_file() {
        let source = NotifyWatchSource::new();
        let result = source.register(Path::new("/cfg/mesh.yaml"));
        assert!(matches!(
            result,
            Err(CacheError::RegistrationError { .. })
        ));
    }

    #[test]
    fn test_register_outside_runtime() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("mesh.yaml");
        fs::write(&config_path, "ingressClass: istio\n").unwrap();

        let result = NotifyWatchSource::new().register(&config_path);
        assert!(matches!(
            result,
            Err(CacheError::RegistrationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_content_change_emits_event() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("mesh.yaml");
        fs::write(&config_path, "ingressClass: istio\n").unwrap();

        let source = NotifyWatchSource::new().with_debounce(Duration::from_millis(50));
        let mut sub = source.register(&config_path).unwrap();
        let mut events = sub.take_events().unwrap();

        tokio::spawn({
            let config_path = config_path.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                fs::write(&config_path, "ingressClass: nginx\n").unwrap();
            }
        });

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no change notification")
            .expect("stream ended");
        assert_eq!(event.path, config_path);
    }

    #[tokio::test]
    async fn test_unchanged_content_is_suppressed() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("mesh.yaml");
        fs::write(&config_path, "ingressClass: istio\n").unwrap();

        // The window lets the rewrite finish before the file is hashed again
        let source = NotifyWatchSource::new().with_debounce(Duration::from_millis(100));
        let mut sub = source.register(&config_path).unwrap();
        let mut events = sub.take_events().unwrap();

        fs::write(&config_path, "ingressClass: istio\n").unwrap();

        let result = timeout(Duration::from_millis(500), events.recv()).await;
        assert!(result.is_err(), "identical rewrite should not notify");
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("mesh.yaml");
        fs::write(&config_path, "ingressClass: istio\n").unwrap();

        let mut sub = NotifyWatchSource::new().register(&config_path).unwrap();
        let mut events = sub.take_events().unwrap();

        sub.close().unwrap();
        let next = timeout(Duration::from_secs(2), events.recv()).await.unwrap();
        assert!(next.is_none());

        // Closing twice is a no-op
        assert!(sub.close().is_ok());
    }

    #[test]
    fn test_debounce_duration() {
        let source = NotifyWatchSource::new().with_debounce(Duration::from_millis(500));
        assert_eq!(source.debounce(), Duration::from_millis(500));
    }
}
