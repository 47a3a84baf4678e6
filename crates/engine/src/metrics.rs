//! Engine counters
//!
//! The counters use Relaxed ordering: they are purely observational and do
//! not synchronize any other memory operations.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a `DocumentEngine`
#[derive(Debug, Default)]
pub struct EngineMetrics {
    updates_applied: AtomicU64,
    updates_not_applied: AtomicU64,
    updates_failed: AtomicU64,
    conflict_retries: AtomicU64,
    records_deleted: AtomicU64,
    group_calls: AtomicU64,
    groups_succeeded: AtomicU64,
}

impl EngineMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_applied(&self) {
        self.updates_not_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.updates_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict_retry(&self) {
        self.conflict_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deleted(&self) {
        self.records_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_group(&self, succeeded: bool) {
        self.group_calls.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.groups_succeeded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_not_applied: self.updates_not_applied.load(Ordering::Relaxed),
            updates_failed: self.updates_failed.load(Ordering::Relaxed),
            conflict_retries: self.conflict_retries.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
            group_calls: self.group_calls.load(Ordering::Relaxed),
            groups_succeeded: self.groups_succeeded.load(Ordering::Relaxed),
        }
    }
}

/// Engine metrics
///
/// Provides statistics about single-key and group updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Single-key updates and deletes that were written back
    pub updates_applied: u64,
    /// Single-key updates and deletes whose key did not exist
    pub updates_not_applied: u64,
    /// Single-key updates and deletes that ended in an error
    pub updates_failed: u64,
    /// Single-key restarts caused by write conflicts
    pub conflict_retries: u64,
    /// Records removed by deletes
    pub records_deleted: u64,
    /// Group update and group delete calls
    pub group_calls: u64,
    /// Group calls that returned true
    pub groups_succeeded: u64,
}

impl MetricsSnapshot {
    /// Total single-key updates attempted
    pub fn total_updates(&self) -> u64 {
        self.updates_applied + self.updates_not_applied + self.updates_failed
    }

    /// Failure rate (failed / total)
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_updates();
        if total > 0 {
            self.updates_failed as f64 / total as f64
        } else {
            0.0
        }
    }
}
