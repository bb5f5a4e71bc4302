// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the cache inventory engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `repocache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_bytes` suffix for size histograms

use metrics::{counter, histogram};
use std::time::Instant;

/// Record a catalog mutation (add, remove, purge, register).
pub fn record_catalog_op(operation: &str, status: &str) {
    counter!(
        "repocache_catalog_ops_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the outcome of building one per-volume deletion plan.
pub fn record_plan(volume: &str, outcome: &str) {
    counter!(
        "repocache_deletion_plans_total",
        "volume" => volume.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record how many candidate rows one selection query examined.
pub fn record_selection_scan(volume: &str, rows: usize) {
    histogram!(
        "repocache_selection_scan_rows",
        "volume" => volume.to_string()
    )
    .record(rows as f64);
}

/// Record bytes actually freed by executing a deletion plan.
pub fn record_bytes_freed(volume: &str, bytes: i64) {
    histogram!(
        "repocache_evicted_bytes",
        "volume" => volume.to_string()
    )
    .record(bytes.max(0) as f64);
}

/// RAII timer that records operation latency on drop.
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(
            "repocache_operation_seconds",
            "operation" => self.operation
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}
