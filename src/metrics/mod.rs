//! OpenTelemetry metrics for configuration reloads.
//!
//! Provides:
//! - Reload attempts/success/failures
//! - Reload duration
//! - Configuration age
//!
//! # Examples
//!
//! ```rust,no_run
//! use meshconfig_cache::core::FsCache;
//! use meshconfig_cache::metrics::CacheMetrics;
//! use meshconfig_cache::mesh::{MeshConfig, default_mesh_config};
//! use opentelemetry::global;
//!
//! # async fn example() -> meshconfig_cache::error::Result<()> {
//! let path = "/etc/istio/config/mesh";
//! let cache = FsCache::builder(path, default_mesh_config(), MeshConfig::merger_for(path.as_ref()))
//!     .with_metrics(CacheMetrics::new(global::meter("meshconfig")))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod cache_metrics;

pub use cache_metrics::CacheMetrics;
pub(crate) use cache_metrics::FailureKind;
