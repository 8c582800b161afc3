//! Reload metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Reason label attached to failed reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    /// The file could not be read.
    Io,
    /// The file could not be merged onto the defaults.
    Parse,
}

impl FailureKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Parse => "parse",
        }
    }
}

/// Metrics collector for cache reloads.
///
/// Tracks reload attempts, outcomes, latencies and how long the cached value
/// has been in place, using OpenTelemetry instruments.
///
/// # Examples
///
/// ```rust,no_run
/// use meshconfig_cache::metrics::CacheMetrics;
/// use opentelemetry::global;
///
/// let metrics = CacheMetrics::new(global::meter("meshconfig"));
/// metrics.update_config_age();
/// ```
#[derive(Clone)]
pub struct CacheMetrics {
    reload_attempts: Counter<u64>,
    reload_success: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    config_age_seconds: Gauge<i64>,
    last_update: Arc<Mutex<Instant>>,
}

impl CacheMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let reload_attempts = meter
            .u64_counter("meshconfig_cache.reload.attempts")
            .with_description("Total number of reload attempts")
            .build();

        let reload_success = meter
            .u64_counter("meshconfig_cache.reload.success")
            .with_description("Number of reloads that replaced the cached value")
            .build();

        let reload_failures = meter
            .u64_counter("meshconfig_cache.reload.failures")
            .with_description("Number of failed reloads, by reason")
            .build();

        let reload_duration = meter
            .f64_histogram("meshconfig_cache.reload.duration")
            .with_description("Duration of reload operations in seconds")
            .with_unit("s")
            .build();

        let config_age_seconds = meter
            .i64_gauge("meshconfig_cache.age")
            .with_description("Time since the cached value was last replaced in seconds")
            .with_unit("s")
            .build();

        Self {
            reload_attempts,
            reload_success,
            reload_failures,
            reload_duration,
            config_age_seconds,
            last_update: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Start a reload timer.
    pub(crate) fn start_reload(&self) -> Instant {
        self.reload_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a reload that replaced the cached value.
    pub(crate) fn record_reload_success(&self, start: Instant) {
        self.reload_success.add(1, &[]);
        self.reload_duration
            .record(start.elapsed().as_secs_f64(), &[]);
        *self.last_update.lock() = Instant::now();
    }

    /// Record a reload that left the cached value untouched.
    pub(crate) fn record_reload_failure(&self, start: Instant, kind: FailureKind) {
        self.reload_failures
            .add(1, &[KeyValue::new("reason", kind.as_str())]);
        self.reload_duration
            .record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Publish the configuration age.
    ///
    /// Call this periodically; the cache itself only updates it on reload.
    pub fn update_config_age(&self) {
        let age_secs = self.last_update.lock().elapsed().as_secs() as i64;
        self.config_age_seconds.record(age_secs, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::global;

    #[test]
    fn test_metrics_operations() {
        let metrics = CacheMetrics::new(global::meter("test"));

        let timer = metrics.start_reload();
        metrics.record_reload_success(timer);

        let timer = metrics.start_reload();
        metrics.record_reload_failure(timer, FailureKind::Parse);

        metrics.update_config_age();
    }

    #[test]
    fn test_clone_shares_last_update() {
        let metrics = CacheMetrics::new(global::meter("test"));
        let metrics2 = metrics.clone();

        let timer = metrics2.start_reload();
        metrics2.record_reload_success(timer);

        assert!(Arc::ptr_eq(&metrics.last_update, &metrics2.last_update));
    }

    #[test]
    fn test_failure_labels() {
        assert_eq!(FailureKind::Io.as_str(), "io");
        assert_eq!(FailureKind::Parse.as_str(), "parse");
    }
}
