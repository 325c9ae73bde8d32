//! Metrics registry for campusdb
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; exactness across threads is not required

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    results_too_large: AtomicU64,
    /// Rows returned by successful queries
    rows_returned: AtomicU64,
    datasets_added: AtomicU64,
    datasets_removed: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful query and its row count
    pub fn record_query(&self, rows: usize) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        self.rows_returned.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_results_too_large(&self) {
        self.results_too_large.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_datasets_added(&self) {
        self.datasets_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_datasets_removed(&self) {
        self.datasets_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            results_too_large: self.results_too_large.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            datasets_added: self.datasets_added.load(Ordering::Relaxed),
            datasets_removed: self.datasets_removed.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub results_too_large: u64,
    pub rows_returned: u64,
    pub datasets_added: u64,
    pub datasets_removed: u64,
}
