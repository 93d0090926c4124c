// Record hot-path benchmarks
// Author: kelexine (https://github.com/kelexine)

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gateledger::signature::SignatureCache;
use gateledger::usage::{RequestRecord, TokenUsage, UsageStore};

fn bench_record(c: &mut Criterion) {
    let store = UsageStore::default();
    c.bench_function("usage_record_full_window", |b| {
        b.iter(|| {
            store.record(black_box(RequestRecord::new(
                "gemini",
                "gemini-2.5-pro",
                "sk-bench",
                TokenUsage::new(1000, 500),
            )))
        })
    });

    let store = UsageStore::default();
    for i in 0..5_000 {
        store.record(RequestRecord::new(
            "claude",
            format!("model-{}", i % 10),
            format!("key-{}", i % 50),
            TokenUsage::new(10, 10),
        ));
    }
    c.bench_function("usage_snapshot_500_nodes", |b| b.iter(|| black_box(store.snapshot())));
}

fn bench_signatures(c: &mut Criterion) {
    let cache = SignatureCache::default();
    let text = "Let me reason about the failing test step by step.".repeat(20);
    let signature = "E".repeat(256);
    cache.cache_signature("claude", &text, &signature);

    c.bench_function("signature_lookup_hit", |b| {
        b.iter(|| black_box(cache.get_cached_signature("claude", black_box(&text))))
    });
    c.bench_function("signature_store_overwrite", |b| {
        b.iter(|| cache.cache_signature("claude", black_box(&text), black_box(&signature)))
    });
}

criterion_group!(benches, bench_record, bench_signatures);
criterion_main!(benches);
