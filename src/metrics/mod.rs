// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    REQUESTS_TOTAL,
    RATE_LIMITED_TOTAL,
    UPSTREAM_DURATION,
    UPSTREAM_TIMEOUTS,
    CACHE_OPERATIONS,
    CACHE_ENTRIES,
};

/// Helper to record a gateway response
pub fn record_request(route: &str, status_code: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[route, &status_code.to_string()])
        .inc();
}

/// Helper to record a forwarded call
pub fn record_upstream_call(route: &str, duration_secs: f64) {
    UPSTREAM_DURATION
        .with_label_values(&[route])
        .observe(duration_secs);
}

pub fn record_upstream_timeout(route: &str) {
    UPSTREAM_TIMEOUTS.with_label_values(&[route]).inc();
}

pub fn record_rate_limited() {
    RATE_LIMITED_TOTAL.inc();
}

/// Helper to record query cache operations (hit, miss, write, eviction)
pub fn record_cache_operation(operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[operation]).inc();
}

pub fn update_cache_entries(count: usize) {
    CACHE_ENTRIES.set(count as f64);
}
