// Signature cache tests - public API only
// Author: kelexine (https://github.com/kelexine)

use gateledger::signature::{
    fingerprint, is_valid_signature, model_group, SignatureCache, SignatureCacheConfig,
    MIN_SIGNATURE_LEN,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn signature(seed: &str) -> String {
    format!("{}{}", seed, "x".repeat(MIN_SIGNATURE_LEN))
}

#[test]
fn test_round_trip() {
    let cache = SignatureCache::default();
    let sig = signature("EqQBCkgIARABGAIiQO");
    cache.cache_signature("claude", "I should check the tests first.", &sig);
    assert_eq!(
        cache.get_cached_signature("claude", "I should check the tests first."),
        Some(sig)
    );
}

#[test]
fn test_group_isolation() {
    let cache = SignatureCache::default();
    let text = "The user wants a refactor.";
    cache.cache_signature("claude", text, &signature("claude"));
    cache.cache_signature("gemini", text, &signature("gemini"));

    assert_eq!(cache.get_cached_signature("claude", text), Some(signature("claude")));
    assert_eq!(cache.get_cached_signature("gemini", text), Some(signature("gemini")));
    assert_eq!(cache.get_cached_signature("gpt", text), None);
}

#[test]
fn test_rejections() {
    let cache = SignatureCache::default();
    cache.cache_signature("claude", "", &signature("a"));
    cache.cache_signature("claude", "text", "");
    cache.cache_signature("claude", "short", &"s".repeat(MIN_SIGNATURE_LEN - 1));
    cache.cache_signature("", "no group", &signature("b"));

    assert_eq!(cache.get_cached_signature("claude", ""), None);
    assert_eq!(cache.get_cached_signature("claude", "text"), None);
    assert_eq!(cache.get_cached_signature("claude", "short"), None);
    assert_eq!(cache.get_cached_signature("", "no group"), None);
    assert!(cache.is_empty());
    assert_eq!(cache.stats().rejects, 4);
}

#[test]
fn test_exact_threshold_accepted() {
    let cache = SignatureCache::default();
    let sig = "s".repeat(MIN_SIGNATURE_LEN);
    assert!(cache.has_valid_signature("claude", &sig));
    cache.cache_signature("claude", "edge", &sig);
    assert_eq!(cache.get_cached_signature("claude", "edge"), Some(sig));
}

#[test]
fn test_scoped_clear() {
    let cache = SignatureCache::default();
    cache.cache_signature("claude", "a", &signature("1"));
    cache.cache_signature("claude", "b", &signature("2"));
    cache.cache_signature("gemini", "a", &signature("3"));

    cache.clear_signature_cache("claude");

    assert_eq!(cache.get_cached_signature("claude", "a"), None);
    assert_eq!(cache.get_cached_signature("claude", "b"), None);
    assert_eq!(cache.get_cached_signature("gemini", "a"), Some(signature("3")));
}

#[test]
fn test_full_clear() {
    let cache = SignatureCache::default();
    cache.cache_signature("claude", "a", &signature("1"));
    cache.cache_signature("gemini", "b", &signature("2"));
    cache.cache_signature("gpt", "c", &signature("3"));

    cache.clear_signature_cache("");

    assert!(cache.is_empty());
    assert_eq!(cache.stats().groups, 0);
    assert_eq!(cache.get_cached_signature("gemini", "b"), None);
}

#[test]
fn test_overwrite_keeps_latest() {
    let cache = SignatureCache::default();
    cache.cache_signature("claude", "same text", &signature("old"));
    cache.cache_signature("claude", "same text", &signature("new"));

    assert_eq!(
        cache.get_cached_signature("claude", "same text"),
        Some(signature("new"))
    );
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_ttl_expiry() {
    let cache = SignatureCache::new(SignatureCacheConfig {
        ttl: Duration::from_millis(30),
        ..Default::default()
    });
    cache.cache_signature("gemini", "fleeting", &signature("f"));
    assert!(cache.get_cached_signature("gemini", "fleeting").is_some());

    thread::sleep(Duration::from_millis(80));
    assert_eq!(cache.get_cached_signature("gemini", "fleeting"), None);
}

#[test]
fn test_concurrent_writers_and_clears() {
    let cache = Arc::new(SignatureCache::new(SignatureCacheConfig {
        max_entries_per_group: 10_000,
        ..Default::default()
    }));
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = cache.clone();
            thread::spawn(move || {
                let group = if worker % 2 == 0 { "claude" } else { "gemini" };
                for i in 0..500 {
                    let text = format!("thought {} {}", worker, i);
                    cache.cache_signature(group, &text, &signature(&text));
                    if let Some(found) = cache.get_cached_signature(group, &text) {
                        assert_eq!(found, signature(&text));
                    }
                    if worker == 0 && i % 100 == 0 {
                        cache.clear_signature_cache("gemini");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // A write issued after every clear has returned stays visible.
    cache.cache_signature("gemini", "after", &signature("after"));
    assert_eq!(
        cache.get_cached_signature("gemini", "after"),
        Some(signature("after"))
    );
    // Claude was never cleared, so every claude write survives.
    for worker in (0..8).step_by(2) {
        for i in 0..500 {
            let text = format!("thought {} {}", worker, i);
            assert_eq!(
                cache.get_cached_signature("claude", &text),
                Some(signature(&text))
            );
        }
    }
}

#[test]
fn test_helpers() {
    assert_eq!(fingerprint("abc"), fingerprint("abc"));
    assert_ne!(fingerprint("abc"), fingerprint("abd"));
    assert!(is_valid_signature("any", &"z".repeat(64)));
    assert_eq!(model_group("gemini-2.5-pro"), "gemini");
}

proptest! {
    #[test]
    fn prop_round_trip(
        group in "[a-z]{1,12}",
        text in ".{1,200}",
        sig in "[A-Za-z0-9+/=]{50,120}",
    ) {
        let cache = SignatureCache::default();
        cache.cache_signature(&group, &text, &sig);
        prop_assert_eq!(cache.get_cached_signature(&group, &text), Some(sig));
    }

    #[test]
    fn prop_groups_never_share(
        text in ".{1,100}",
        first in "[A-Za-z0-9]{50,80}",
        second in "[A-Za-z0-9]{50,80}",
    ) {
        let cache = SignatureCache::default();
        cache.cache_signature("g1", &text, &first);
        cache.cache_signature("g2", &text, &second);
        prop_assert_eq!(cache.get_cached_signature("g1", &text), Some(first));
        prop_assert_eq!(cache.get_cached_signature("g2", &text), Some(second));
    }
}
