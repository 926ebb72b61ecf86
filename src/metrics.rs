// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for dnsweave.
//!
//! All metrics use the namespace prefix `dnsweave_` and live in
//! [`METRICS_REGISTRY`], which the HTTP server exposes at `/metrics`.
//!
//! # Metrics Categories
//!
//! - **Cycle Metrics** - Sync cycle outcomes and durations
//! - **Adapter Metrics** - Source and sink failures by identity
//! - **Record Metrics** - Published set size and changes between cycles
//! - **Query Metrics** - DNS questions answered by the resolution store
//! - **Reconciliation Metrics** - Add/remove operations against external systems
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsweave::metrics::record_cycle_success;
//!
//! record_cycle_success(std::time::Duration::from_millis(120));
//! ```

use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all dnsweave metrics
const METRICS_NAMESPACE: &str = "dnsweave";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Cycle Metrics
// ============================================================================

/// Total number of sync cycles by outcome
///
/// Labels:
/// - `status`: Outcome (`success`, `partial`, `error`)
pub static CYCLES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cycles_total"),
        "Total number of sync cycles by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of sync cycles in seconds
pub static CYCLE_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_cycle_duration_seconds"),
        "Duration of sync cycles in seconds",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Adapter Metrics
// ============================================================================

/// Total number of adapter failures by stage and identity
///
/// Labels:
/// - `stage`: `source`, `modifier` or `sink`
/// - `adapter`: Adapter identity (e.g., `http.inventory`, `mikrotik`)
pub static ADAPTER_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_adapter_failures_total"),
        "Total number of source, modifier and sink failures",
    );
    let counter = CounterVec::new(opts, &["stage", "adapter"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Record Metrics
// ============================================================================

/// Number of records in the most recently published set
pub static RECORDS_PUBLISHED: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_records_published"),
        "Number of records handed to sinks in the last cycle",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of record changes detected between cycles
///
/// Labels:
/// - `change`: `added` or `removed`
pub static RECORD_CHANGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_record_changes_total"),
        "Total number of records added or removed between cycles",
    );
    let counter = CounterVec::new(opts, &["change"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Query Metrics
// ============================================================================

/// Total number of DNS questions answered
///
/// Labels:
/// - `qtype`: Question type (e.g., `A`, `PTR`, `TXT`)
/// - `result`: `answered` or `empty`
pub static DNS_QUERIES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dns_queries_total"),
        "Total number of DNS questions by type and result",
    );
    let counter = CounterVec::new(opts, &["qtype", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliation operations
///
/// Labels:
/// - `target`: External system (e.g., `mikrotik`)
/// - `operation`: `add` or `remove`
/// - `status`: `success` or `error`
pub static RECONCILE_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconcile_operations_total"),
        "Total number of reconciliation operations by target, operation and status",
    );
    let counter = CounterVec::new(opts, &["target", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a cycle in which every stage succeeded
pub fn record_cycle_success(duration: Duration) {
    CYCLES_TOTAL.with_label_values(&["success"]).inc();
    CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a cycle that published but had adapter failures
pub fn record_cycle_partial(duration: Duration) {
    CYCLES_TOTAL.with_label_values(&["partial"]).inc();
    CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a cycle that did not publish a consistent set
pub fn record_cycle_error(duration: Duration) {
    CYCLES_TOTAL.with_label_values(&["error"]).inc();
    CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record an adapter failure
///
/// # Arguments
/// * `stage` - `source`, `modifier` or `sink`
/// * `adapter` - Adapter identity
pub fn record_adapter_failure(stage: &str, adapter: &str) {
    ADAPTER_FAILURES_TOTAL
        .with_label_values(&[stage, adapter])
        .inc();
}

/// Record the size of the published set and the changes since the last one
#[allow(clippy::cast_precision_loss)]
pub fn record_published(total: usize, added: usize, removed: usize) {
    RECORDS_PUBLISHED.set(total as f64);
    RECORD_CHANGES_TOTAL
        .with_label_values(&["added"])
        .inc_by(added as f64);
    RECORD_CHANGES_TOTAL
        .with_label_values(&["removed"])
        .inc_by(removed as f64);
}

/// Record one answered DNS question
pub fn record_dns_query(qtype: &str, answered: bool) {
    let result = if answered { "answered" } else { "empty" };
    DNS_QUERIES_TOTAL.with_label_values(&[qtype, result]).inc();
}

/// Record one reconciliation operation
pub fn record_reconcile_operation(target: &str, operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    RECONCILE_OPERATIONS_TOTAL
        .with_label_values(&[target, operation, status])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle_outcomes() {
        record_cycle_success(Duration::from_millis(10));
        record_cycle_partial(Duration::from_millis(20));
        record_cycle_error(Duration::from_millis(30));

        assert!(CYCLES_TOTAL.with_label_values(&["success"]).get() > 0.0);
        assert!(CYCLES_TOTAL.with_label_values(&["partial"]).get() > 0.0);
        assert!(CYCLES_TOTAL.with_label_values(&["error"]).get() > 0.0);
        assert!(CYCLE_DURATION_SECONDS.get_sample_count() >= 3);
    }

    #[test]
    fn test_record_adapter_failure() {
        record_adapter_failure("source", "http.metrics-test");

        let counter = ADAPTER_FAILURES_TOTAL.with_label_values(&["source", "http.metrics-test"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_published_changes() {
        let before = RECORD_CHANGES_TOTAL.with_label_values(&["added"]).get();
        record_published(7, 3, 1);

        let after = RECORD_CHANGES_TOTAL.with_label_values(&["added"]).get();
        assert!(after - before >= 3.0);
    }

    #[test]
    fn test_record_dns_query_and_reconcile_operation() {
        record_dns_query("other", false);
        record_reconcile_operation("metrics-test", "add", true);

        assert!(DNS_QUERIES_TOTAL.with_label_values(&["other", "empty"]).get() > 0.0);
        assert!(
            RECONCILE_OPERATIONS_TOTAL
                .with_label_values(&["metrics-test", "add", "success"])
                .get()
                > 0.0
        );
    }

    #[test]
    fn test_gather_metrics() {
        record_cycle_success(Duration::from_millis(5));

        let output = gather_metrics().unwrap();
        assert!(output.contains("dnsweave_cycles_total"));
        assert!(output.contains("dnsweave_cycle_duration_seconds"));
    }
}
