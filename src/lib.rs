//! # meshconfig-cache
//!
//! A live-reloading, in-memory copy of a configuration file.
//!
//! ## Overview
//!
//! [`FsCache`](core::FsCache) keeps the last successfully loaded value of a
//! single configuration file and refreshes it in the background whenever the
//! file changes:
//! - Reads are a short lock and an `Arc` clone, never I/O
//! - Readers see either the previous or the new value, never a partial one
//! - A file that fails to read or parse is logged and the previous value stays
//! - Before the first good load, the cache serves the default configuration
//!
//! The file contents are layered onto the default value by a
//! [`ConfigMerge`](merge::ConfigMerge) collaborator, and changes are reported
//! by a [`WatchSource`](watch::WatchSource). The crate ships the mesh
//! configuration type ([`mesh::MeshConfig`]) together with a file system
//! watcher and a YAML/JSON/TOML overlay merge for it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshconfig_cache::prelude::*;
//!
//! # async fn example() -> meshconfig_cache::error::Result<()> {
//! let cache = FsCache::from_file("/etc/istio/config/mesh").await?;
//!
//! // Cheap snapshot read
//! let mesh = cache.get();
//! println!("trust domain: {}", mesh.trust_domain);
//!
//! // Stop watching; `get` keeps returning the last value
//! cache.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): file system watch source built on `notify`
//! - `metrics`: OpenTelemetry reload metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod merge;
pub mod mesh;
pub mod watch;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Cache, FsCache, FsCacheBuilder, ReloadStats, StaticCache, Validate};
    pub use crate::error::{CacheError, MergeError, Result, ValidationError};
    pub use crate::merge::{ConfigMerge, Format, OverlayMerge};
    pub use crate::mesh::{MeshConfig, default_mesh_config};
    pub use crate::watch::{ManualWatchSource, WatchSource};

    #[cfg(feature = "file-watch")]
    pub use crate::watch::NotifyWatchSource;
}
