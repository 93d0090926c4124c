// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_with_registry, CounterVec, Encoder, Gauge,
    Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // SIGNATURE CACHE METRICS
    // ============================================================================

    /// Signature cache operations
    pub static ref SIGNATURE_CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("signature_cache_operations_total", "Thinking-signature cache operations"),
        &["operation"], // hit, miss, store, reject, expire, evict, clear
        REGISTRY
    ).expect("signature_cache_operations_total registers once");

    /// Entries currently held by the signature cache
    pub static ref SIGNATURE_CACHE_ENTRIES: Gauge = register_gauge_with_registry!(
        Opts::new("signature_cache_entries", "Entries held by the thinking-signature cache"),
        REGISTRY
    ).expect("signature_cache_entries registers once");

    // ============================================================================
    // USAGE METRICS
    // ============================================================================

    /// Completed requests recorded by the usage store
    pub static ref USAGE_RECORDS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("usage_records_total", "Completed requests recorded"),
        &["provider", "model", "status"], // status: success, failure
        REGISTRY
    ).expect("usage_records_total registers once");

    /// Tokens recorded by the usage store
    pub static ref USAGE_TOKENS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("usage_tokens_total", "Tokens recorded"),
        &["model", "type"], // type: input, output, reasoning, cached
        REGISTRY
    ).expect("usage_tokens_total registers once");
}

/// Register every collector up front so all series show up on the first scrape.
pub fn init() {
    lazy_static::initialize(&SIGNATURE_CACHE_OPERATIONS);
    lazy_static::initialize(&SIGNATURE_CACHE_ENTRIES);
    lazy_static::initialize(&USAGE_RECORDS);
    lazy_static::initialize(&USAGE_TOKENS);
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        init();
        SIGNATURE_CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
        USAGE_RECORDS
            .with_label_values(&["gemini", "test-model", "success"])
            .inc();
        USAGE_TOKENS.with_label_values(&["test-model", "input"]).inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("signature_cache_operations_total"));
        assert!(metrics.contains("signature_cache_entries"));
        assert!(metrics.contains("usage_records_total"));
        assert!(metrics.contains("usage_tokens_total"));
    }

    #[test]
    fn test_entries_gauge_present_before_first_update() {
        init();
        assert!(gather_metrics().contains("signature_cache_entries"));
    }
}
