//! Turning raw file contents into a configuration value.
//!
//! The cache never interprets file contents itself; it hands the bytes and its
//! default value to a [`ConfigMerge`] and caches whatever comes back.

mod format;
mod overlay;

pub use format::Format;
pub use overlay::OverlayMerge;

use crate::error::MergeError;

/// Parses raw configuration bytes and overlays them onto a default value.
///
/// Implementations must either return a fully populated value or an error;
/// the cache relies on this to never store a partial configuration.
pub trait ConfigMerge<T>: Send + Sync {
    /// Merge `raw` onto `defaults`.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is malformed, does not match the schema of
    /// `T`, or describes an invalid configuration.
    fn merge(&self, raw: &[u8], defaults: &T) -> Result<T, MergeError>;
}

impl<T, F> ConfigMerge<T> for F
where
    F: Fn(&[u8], &T) -> Result<T, MergeError> + Send + Sync,
{
    fn merge(&self, raw: &[u8], defaults: &T) -> Result<T, MergeError> {
        self(raw, defaults)
    }
}
