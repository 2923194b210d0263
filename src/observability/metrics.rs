//! Scan counters
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every scan of one processor
///
/// All counters use Relaxed ordering; they are read for reporting only and
/// never drive scan behavior.
#[derive(Debug, Default)]
pub struct ScanMetrics {
    /// Initialization scans that covered their whole span
    init_scans_completed: AtomicU64,
    /// Initialization scans that stopped the processor
    init_scans_failed: AtomicU64,
    /// Catch-up scans that delivered everything
    catch_up_scans_completed: AtomicU64,
    /// Catch-up scans that failed their registration
    catch_up_scans_failed: AtomicU64,
    /// Scans discarded before they ran
    scans_cancelled: AtomicU64,
    /// Pre-existing intents handed to the processor
    intents_observed: AtomicU64,
    /// Range-feed values delivered to registrations
    values_emitted: AtomicU64,
    /// Versions skipped because they predate the registration
    values_skipped: AtomicU64,
}

impl ScanMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_init_scans_completed(&self) {
        self.init_scans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_init_scans_failed(&self) {
        self.init_scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_catch_up_scans_completed(&self) {
        self.catch_up_scans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_catch_up_scans_failed(&self) {
        self.catch_up_scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_scans_cancelled(&self) {
        self.scans_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_intents_observed(&self) {
        self.intents_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_values_emitted(&self) {
        self.values_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_values_skipped(&self) {
        self.values_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> ScanMetricsSnapshot {
        ScanMetricsSnapshot {
            init_scans_completed: self.init_scans_completed.load(Ordering::Relaxed),
            init_scans_failed: self.init_scans_failed.load(Ordering::Relaxed),
            catch_up_scans_completed: self.catch_up_scans_completed.load(Ordering::Relaxed),
            catch_up_scans_failed: self.catch_up_scans_failed.load(Ordering::Relaxed),
            scans_cancelled: self.scans_cancelled.load(Ordering::Relaxed),
            intents_observed: self.intents_observed.load(Ordering::Relaxed),
            values_emitted: self.values_emitted.load(Ordering::Relaxed),
            values_skipped: self.values_skipped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanMetricsSnapshot {
    pub init_scans_completed: u64,
    pub init_scans_failed: u64,
    pub catch_up_scans_completed: u64,
    pub catch_up_scans_failed: u64,
    pub scans_cancelled: u64,
    pub intents_observed: u64,
    pub values_emitted: u64,
    pub values_skipped: u64,
}
