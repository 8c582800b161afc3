//! File change notifications.
//!
//! A [`WatchSource`] turns a path into a [`Subscription`], which yields one
//! [`WatchEvent`] per observed change of that file until it is closed. Coalescing
//! bursts of writes is the source's job; consumers reload once per event.

mod manual;
#[cfg(feature = "file-watch")]
mod filesystem;

pub use manual::{ManualSubscription, ManualWatchSource};
#[cfg(feature = "file-watch")]
pub use filesystem::{NotifySubscription, NotifyWatchSource};

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Notification that a watched file changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// The watched path, as it was registered.
    pub path: PathBuf,
}

/// Stream of change notifications for one subscription.
///
/// Ends (`recv` returns `None`) once the subscription is closed.
pub type EventStream = mpsc::UnboundedReceiver<WatchEvent>;

/// A live watch on a single path.
pub trait Subscription: Send {
    /// The watched path.
    fn path(&self) -> &Path;

    /// Take the notification stream.
    ///
    /// The stream has a single consumer, so this returns `Some` only on the
    /// first call.
    fn take_events(&mut self) -> Option<EventStream>;

    /// Stop watching.
    ///
    /// The event stream ends after this is called, whether or not releasing
    /// the underlying watch succeeded. Events already queued may still be
    /// received before the end of the stream. Closing an already closed
    /// subscription is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CloseError`](crate::error::CacheError::CloseError)
    /// if the underlying watch could not be released cleanly.
    fn close(&mut self) -> Result<()>;
}

/// Producer of file change subscriptions.
pub trait WatchSource: Send + Sync {
    /// Start watching `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::RegistrationError`](crate::error::CacheError::RegistrationError)
    /// if the path does not exist or cannot be watched.
    fn register(&self, path: &Path) -> Result<Box<dyn Subscription>>;
}
