//! Reload outcome counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts of reload attempts and their outcomes.
///
/// `attempts` includes reloads that finished after the cache was closed; those
/// are counted as neither success nor failure since their result is discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadStats {
    /// Reloads that ran to completion.
    pub attempts: u64,
    /// Reloads that replaced the cached value.
    pub successes: u64,
    /// Reloads that failed to read or merge the file.
    pub failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ReloadCounters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl ReloadCounters {
    pub(crate) fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.attempts.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.attempts.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_discarded(&self) {
        self.attempts.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> ReloadStats {
        // Attempts is bumped last, so once a reader sees it the outcome
        // counter of that attempt is visible too.
        let attempts = self.attempts.load(Ordering::Acquire);
        ReloadStats {
            attempts,
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let counters = ReloadCounters::default();
        counters.record_success();
        counters.record_failure();
        counters.record_failure();
        counters.record_discarded();

        assert_eq!(
            counters.snapshot(),
            ReloadStats {
                attempts: 4,
                successes: 1,
                failures: 2,
            }
        );
    }
}
