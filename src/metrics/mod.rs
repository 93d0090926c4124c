// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

use crate::usage::TokenUsage;

pub use registry::{
    gather_metrics,
    init,
    SIGNATURE_CACHE_ENTRIES,
    SIGNATURE_CACHE_OPERATIONS,
    USAGE_RECORDS,
    USAGE_TOKENS,
};

/// Helper to record a signature cache operation
pub fn record_signature_operation(operation: &str) {
    SIGNATURE_CACHE_OPERATIONS.with_label_values(&[operation]).inc();
}

pub fn record_signature_operations(operation: &str, count: u64) {
    SIGNATURE_CACHE_OPERATIONS
        .with_label_values(&[operation])
        .inc_by(count as f64);
}

pub fn update_signature_entries(count: usize) {
    SIGNATURE_CACHE_ENTRIES.set(count as f64);
}

/// Helper to record a completed request and its tokens
pub fn record_usage(provider: &str, model: &str, failed: bool, tokens: &TokenUsage) {
    let status = if failed { "failure" } else { "success" };
    USAGE_RECORDS.with_label_values(&[provider, model, status]).inc();

    let by_type = [
        ("input", tokens.input_tokens),
        ("output", tokens.output_tokens),
        ("reasoning", tokens.reasoning_tokens),
        ("cached", tokens.cached_tokens),
    ];
    for (kind, count) in by_type {
        if count > 0 {
            USAGE_TOKENS
                .with_label_values(&[model, kind])
                .inc_by(count as f64);
        }
    }
}
