//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Page fetches (list, search, detail)
//! - Detail scrape slots and scrape duration
//! - Engine operations

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Page fetches total by result.
pub static PAGE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinescrape_page_fetches_total", "Total page fetches"),
        &["result"], // "ok", "timeout", "connection", "status", "body"
    )
    .unwrap()
});

/// Page fetch duration in seconds.
pub static PAGE_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinescrape_page_fetch_duration_seconds",
            "Duration of a single page fetch",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Scrape Metrics
// =============================================================================

/// Detail slots by outcome.
pub static DETAIL_SLOTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinescrape_detail_slots_total",
            "Detail scrape slots by outcome",
        ),
        &["result"], // "ok", "failed", "rejected"
    )
    .unwrap()
});

/// Duration of a whole detail scrape call.
pub static SCRAPE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinescrape_scrape_duration_seconds",
            "Duration of a detail scrape call",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics
// =============================================================================

/// Engine operations by engine, operation and result.
pub static ENGINE_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinescrape_engine_operations_total",
            "Engine operations by outcome",
        ),
        &["engine", "operation", "result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the outcome of an engine operation.
pub fn record_engine_operation<T, E>(engine: &str, operation: &str, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    ENGINE_OPERATIONS
        .with_label_values(&[engine, operation, outcome])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PAGE_FETCHES.clone()),
        Box::new(PAGE_FETCH_DURATION.clone()),
        Box::new(DETAIL_SLOTS.clone()),
        Box::new(SCRAPE_DURATION.clone()),
        Box::new(ENGINE_OPERATIONS.clone()),
    ]
}

/// Register every core metric in a fresh registry and encode it as
/// Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }

    #[test]
    fn test_record_engine_operation() {
        let ok: Result<(), ()> = Ok(());
        let before = ENGINE_OPERATIONS
            .with_label_values(&["metrics-test", "list", "ok"])
            .get();
        record_engine_operation("metrics-test", "list", &ok);
        let after = ENGINE_OPERATIONS
            .with_label_values(&["metrics-test", "list", "ok"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_encode_metrics_includes_engine_operations() {
        let failed: Result<(), ()> = Err(());
        record_engine_operation("metrics-encode", "search", &failed);

        let text = encode_metrics().unwrap();
        assert!(text.contains("cinescrape_engine_operations_total"));
        assert!(text.contains(r#"engine="metrics-encode""#));
        assert!(text.contains(r#"result="error""#));
    }
}
