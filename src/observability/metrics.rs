//! Query metrics
//!
//! Counters only, monotonic, reset only when the registry is created.
//! Relaxed atomics; a snapshot is not a consistent cut across counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one router
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Queries that produced a result
    queries_executed: AtomicU64,
    /// Queries that failed
    queries_failed: AtomicU64,
    /// Queries delegated to a native adapter
    native_executions: AtomicU64,
    /// Queries evaluated by the memory executor
    fallback_executions: AtomicU64,
    /// Entities drained from adapters
    entities_scanned: AtomicU64,
    /// Batches started
    batches_executed: AtomicU64,
    /// Batches that failed
    batches_failed: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_native_executions(&self) {
        self.native_executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fallback_executions(&self) {
        self.fallback_executions.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds drained entities to the scan counter
    pub fn add_entities_scanned(&self, count: u64) {
        self.entities_scanned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches_executed(&self) {
        self.batches_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_batches_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            native_executions: self.native_executions.load(Ordering::Relaxed),
            fallback_executions: self.fallback_executions.load(Ordering::Relaxed),
            entities_scanned: self.entities_scanned.load(Ordering::Relaxed),
            batches_executed: self.batches_executed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
        }
    }

    /// Current snapshot as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub native_executions: u64,
    pub fallback_executions: u64,
    pub entities_scanned: u64,
    pub batches_executed: u64,
    pub batches_failed: u64,
}
