//! Prometheus metrics for the catalog engine.
//!
//! This module provides metrics for:
//! - Catalog API requests (per endpoint, success/error, duration)
//! - Request cache (hits, misses, coalesced joins)
//! - Page loader (background batches, fallbacks, discarded responses)
//!
//! Collectors are not registered anywhere by the library; hosts register
//! `all_metrics()` in their own registry.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Catalog API
// =============================================================================

/// Catalog API requests total.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vitrina_catalog_requests_total", "Total catalog API requests"),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Catalog API request duration.
pub static CATALOG_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vitrina_catalog_request_duration_seconds",
            "Duration of catalog API calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Request cache
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vitrina_cache_lookups_total", "Request cache lookups"),
        &["result"], // "hit", "miss", "coalesced"
    )
    .unwrap()
});

// =============================================================================
// Page loader
// =============================================================================

/// Fallback paths taken.
pub static FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vitrina_fallbacks_total", "Fallback requests issued"),
        &["kind"], // "without_projection", "empty_category", "relaxed_categories"
    )
    .unwrap()
});

/// Background batches merged into the local store.
pub static BACKGROUND_BATCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vitrina_background_batches_total",
        "Background batches merged into the local listing store",
    )
    .unwrap()
});

/// Server-mode responses dropped because a newer request superseded them.
pub static STALE_RESPONSES_DISCARDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vitrina_stale_responses_discarded_total",
        "Server responses discarded because a newer request was issued",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(CATALOG_REQUEST_DURATION.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(FALLBACKS.clone()),
        Box::new(BACKGROUND_BATCHES.clone()),
        Box::new(STALE_RESPONSES_DISCARDED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "vitrina_cache_lookups_total"));
    }
}
