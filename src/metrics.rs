//! Resolution work counters
//!
//! Lightweight, lock-free counters describing how much work the resolver
//! did. A session owns one [`Metrics`] and hands a reference to every
//! search it starts.
//!
//! # Overview
//!
//! - Queries started and solutions produced
//! - Predicate calls and clause activations
//! - Head unifications attempted and failed
//! - Backtracks (choice frames exhausted and popped)
//!
//! Counting can be switched off through
//! [`SessionConfig::collect_stats`](crate::SessionConfig); every `record_*`
//! method then returns after a single relaxed load.
//!
//! # Example
//!
//! ```
//! use hornlog::metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.record_call();
//! metrics.record_solution();
//!
//! let stats = metrics.snapshot();
//! assert_eq!(stats.calls, 1);
//! assert_eq!(stats.solutions, 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe resolution counters.
pub struct Metrics {
    enabled: AtomicBool,

    // ========================================================================
    // Query Metrics
    // ========================================================================
    /// Queries started
    queries: AtomicU64,

    /// Solutions handed to the caller
    solutions: AtomicU64,

    // ========================================================================
    // Search Metrics
    // ========================================================================
    /// Compound goals looked up in the knowledge base
    calls: AtomicU64,

    /// Clauses renamed and tried against a goal
    activations: AtomicU64,

    /// Head unifications attempted
    unifications: AtomicU64,

    /// Head unifications that failed
    unification_failures: AtomicU64,

    /// Choice frames exhausted and discarded
    backtracks: AtomicU64,
}

/// Point-in-time copy of all counters.
///
/// Plain values, serializable for logging or reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub queries: u64,
    pub solutions: u64,
    pub calls: u64,
    pub activations: u64,
    pub unifications: u64,
    pub unification_failures: u64,
    pub backtracks: u64,
}

impl Metrics {
    /// Create an enabled collector with all counters at zero.
    pub fn new() -> Self {
        Metrics::with_enabled(true)
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            queries: AtomicU64::new(0),
            solutions: AtomicU64::new(0),
            calls: AtomicU64::new(0),
            activations: AtomicU64::new(0),
            unifications: AtomicU64::new(0),
            unification_failures: AtomicU64::new(0),
            backtracks: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.is_enabled() {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_query(&self) {
        self.bump(&self.queries);
    }

    pub fn record_solution(&self) {
        self.bump(&self.solutions);
    }

    pub fn record_call(&self) {
        self.bump(&self.calls);
    }

    pub fn record_activation(&self) {
        self.bump(&self.activations);
    }

    /// Record one head unification and whether it succeeded
    pub fn record_unification(&self, succeeded: bool) {
        self.bump(&self.unifications);
        if !succeeded {
            self.bump(&self.unification_failures);
        }
    }

    pub fn record_backtrack(&self) {
        self.bump(&self.backtracks);
    }

    /// Get a snapshot of current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            solutions: self.solutions.load(Ordering::Relaxed),
            calls: self.calls.load(Ordering::Relaxed),
            activations: self.activations.load(Ordering::Relaxed),
            unifications: self.unifications.load(Ordering::Relaxed),
            unification_failures: self.unification_failures.load(Ordering::Relaxed),
            backtracks: self.backtracks.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter; the enabled flag is left alone.
    pub fn reset(&self) {
        for counter in [
            &self.queries,
            &self.solutions,
            &self.calls,
            &self.activations,
            &self.unifications,
            &self.unification_failures,
            &self.backtracks,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("enabled", &self.is_enabled())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
