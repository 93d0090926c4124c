// Thinking-signature cache keyed by (model group, content fingerprint)
// Author: kelexine (https://github.com/kelexine)

use super::validation::{fingerprint, is_valid_signature_with, Fingerprint};
use super::{
    DEFAULT_MAX_ENTRIES_PER_GROUP, DEFAULT_SIGNATURE_TTL, MIN_SIGNATURE_LEN,
    SKIP_SIGNATURE_SENTINEL,
};
use crate::metrics;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Tunables for [`SignatureCache`].
#[derive(Debug, Clone)]
pub struct SignatureCacheConfig {
    /// How long a signature stays retrievable after it was cached.
    pub ttl: Duration,
    /// Live entries kept per model group before the oldest is evicted.
    pub max_entries_per_group: usize,
    /// Shortest signature accepted for caching.
    pub min_signature_len: usize,
}

impl Default for SignatureCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SIGNATURE_TTL,
            max_entries_per_group: DEFAULT_MAX_ENTRIES_PER_GROUP,
            min_signature_len: MIN_SIGNATURE_LEN,
        }
    }
}

/// Point-in-time counters for the admin API.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureCacheStats {
    pub entries: usize,
    pub groups: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub rejects: u64,
    pub evictions: u64,
    pub expirations: u64,
}

#[derive(Debug)]
struct CacheEntry {
    signature: String,
    expires_at: Instant,
    /// Insertion order, used to pick the eviction victim.
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct GroupShard {
    entries: HashMap<Fingerprint, CacheEntry>,
}

impl GroupShard {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    fn evict_oldest(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(key, _)| *key);
        match victim {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    rejects: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Concurrent store mapping (model group, fingerprint) to a provider signature.
///
/// Each model group lives in its own shard behind its own mutex, so traffic
/// for one family never waits on another. Shards are only dropped from the
/// outer map while nobody holds a handle to them, which keeps a clear from
/// racing an insert into a detached shard.
#[derive(Debug)]
pub struct SignatureCache {
    config: SignatureCacheConfig,
    groups: RwLock<HashMap<String, Arc<Mutex<GroupShard>>>>,
    next_seq: AtomicU64,
    counters: Counters,
}

impl Default for SignatureCache {
    fn default() -> Self {
        Self::new(SignatureCacheConfig::default())
    }
}

impl SignatureCache {
    pub fn new(config: SignatureCacheConfig) -> Self {
        Self {
            config,
            groups: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &SignatureCacheConfig {
        &self.config
    }

    /// Validity check callers can run before paying for a fingerprint.
    pub fn has_valid_signature(&self, model_group: &str, signature: &str) -> bool {
        is_valid_signature_with(model_group, signature, self.config.min_signature_len)
    }

    /// Remember `signature` for the thinking `text` produced by `model_group`.
    ///
    /// Empty inputs and signatures below the minimum length are ignored.
    /// Caching the same (group, text) again overwrites the previous entry and
    /// restarts its TTL.
    pub fn cache_signature(&self, model_group: &str, text: &str, signature: &str) {
        if model_group.is_empty()
            || text.is_empty()
            || signature.is_empty()
            || !self.has_valid_signature(model_group, signature)
        {
            self.counters.rejects.fetch_add(1, Ordering::Relaxed);
            metrics::record_signature_operation("reject");
            return;
        }

        let key = fingerprint(text);
        let shard = self.shard_or_insert(model_group);
        let mut shard = shard.lock();
        let now = Instant::now();

        if !shard.entries.contains_key(&key)
            && shard.entries.len() >= self.config.max_entries_per_group
        {
            let expired = shard.purge_expired(now);
            self.note_expired(expired);
            if shard.entries.len() >= self.config.max_entries_per_group && shard.evict_oldest() {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                metrics::record_signature_operation("evict");
                debug!("Evicted oldest thinking signature from group {}", model_group);
            }
        }

        shard.entries.insert(
            key,
            CacheEntry {
                signature: signature.to_string(),
                expires_at: now + self.config.ttl,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
        self.counters.stores.fetch_add(1, Ordering::Relaxed);
        metrics::record_signature_operation("store");
        debug!(
            "Cached thinking signature: group={} fingerprint={} (sig length: {})",
            model_group,
            key.short(),
            signature.len()
        );
    }

    /// Look up the signature cached for `text` under `model_group`.
    ///
    /// Expired entries are removed on the way out and reported as absent.
    pub fn get_cached_signature(&self, model_group: &str, text: &str) -> Option<String> {
        if model_group.is_empty() || text.is_empty() {
            return self.miss();
        }

        let Some(shard) = self.shard(model_group) else {
            return self.miss();
        };
        let key = fingerprint(text);
        let mut shard = shard.lock();
        let now = Instant::now();

        let lookup = shard
            .entries
            .get(&key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.signature.clone()));

        match lookup {
            Some(Some(signature)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_signature_operation("hit");
                Some(signature)
            }
            Some(None) => {
                shard.entries.remove(&key);
                drop(shard);
                self.note_expired(1);
                debug!(
                    "Thinking signature expired: group={} fingerprint={}",
                    model_group,
                    key.short()
                );
                self.miss()
            }
            None => {
                drop(shard);
                self.miss()
            }
        }
    }

    /// Cached signature, or the skip sentinel when none is available.
    pub fn signature_or_sentinel(&self, model_group: &str, text: &str) -> String {
        self.get_cached_signature(model_group, text)
            .unwrap_or_else(|| SKIP_SIGNATURE_SENTINEL.to_string())
    }

    /// Drop every entry of `model_group`, or of every group when it is empty.
    pub fn clear_signature_cache(&self, model_group: &str) {
        if model_group.is_empty() {
            self.clear_all();
            return;
        }

        if let Some(shard) = self.shard(model_group) {
            let removed = {
                let mut shard = shard.lock();
                let removed = shard.entries.len();
                shard.entries.clear();
                removed
            };
            drop(shard);
            self.drop_idle_shards();
            debug!("Cleared {} thinking signatures for group {}", removed, model_group);
        }
        metrics::record_signature_operation("clear");
        metrics::update_signature_entries(self.len());
    }

    fn clear_all(&self) {
        let mut groups = self.groups.write();
        let removed: usize = groups
            .values()
            .map(|shard| {
                let mut shard = shard.lock();
                let removed = shard.entries.len();
                shard.entries.clear();
                removed
            })
            .sum();
        groups.retain(|_, shard| Arc::strong_count(shard) > 1);
        drop(groups);

        metrics::record_signature_operation("clear");
        metrics::update_signature_entries(self.len());
        debug!("Cleared all {} thinking signatures", removed);
    }

    /// Remove every expired entry across all groups. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let shards: Vec<Arc<Mutex<GroupShard>>> = self.groups.read().values().cloned().collect();
        let now = Instant::now();
        let removed: usize = shards.iter().map(|shard| shard.lock().purge_expired(now)).sum();
        drop(shards);

        self.note_expired(removed);
        self.drop_idle_shards();
        metrics::update_signature_entries(self.len());
        if removed > 0 {
            debug!("Purged {} expired thinking signatures", removed);
        }
        removed
    }

    /// Number of stored entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.groups
            .read()
            .values()
            .map(|shard| shard.lock().entries.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SignatureCacheStats {
        let (entries, groups) = {
            let groups = self.groups.read();
            let entries = groups.values().map(|shard| shard.lock().entries.len()).sum();
            (entries, groups.len())
        };
        SignatureCacheStats {
            entries,
            groups,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            rejects: self.counters.rejects.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
        }
    }

    fn shard(&self, model_group: &str) -> Option<Arc<Mutex<GroupShard>>> {
        self.groups.read().get(model_group).cloned()
    }

    fn shard_or_insert(&self, model_group: &str) -> Arc<Mutex<GroupShard>> {
        if let Some(shard) = self.shard(model_group) {
            return shard;
        }
        self.groups
            .write()
            .entry(model_group.to_string())
            .or_default()
            .clone()
    }

    /// Forget empty shards nobody else is holding.
    fn drop_idle_shards(&self) {
        self.groups
            .write()
            .retain(|_, shard| Arc::strong_count(shard) > 1 || !shard.lock().entries.is_empty());
    }

    fn note_expired(&self, count: usize) {
        if count > 0 {
            self.counters
                .expirations
                .fetch_add(count as u64, Ordering::Relaxed);
            metrics::record_signature_operations("expire", count as u64);
        }
    }

    fn miss(&self) -> Option<String> {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_signature_operation("miss");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sig(tag: char) -> String {
        std::iter::repeat(tag).take(64).collect()
    }

    fn short_ttl_cache(ttl: Duration) -> SignatureCache {
        SignatureCache::new(SignatureCacheConfig {
            ttl,
            ..Default::default()
        })
    }

    #[test]
    fn test_store_and_retrieve() {
        let cache = SignatureCache::default();
        cache.cache_signature("claude", "Let me think about this", &sig('a'));
        assert_eq!(
            cache.get_cached_signature("claude", "Let me think about this"),
            Some(sig('a'))
        );
    }

    #[test]
    fn test_missing_signature() {
        let cache = SignatureCache::default();
        assert_eq!(cache.get_cached_signature("claude", "nothing here"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = short_ttl_cache(Duration::from_millis(20));
        cache.cache_signature("gemini", "thought", &sig('g'));
        assert_eq!(cache.len(), 1);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get_cached_signature("gemini", "thought"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_purge_expired_drops_idle_groups() {
        let cache = short_ttl_cache(Duration::from_millis(20));
        cache.cache_signature("gemini", "one", &sig('1'));
        cache.cache_signature("claude", "two", &sig('2'));

        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.purge_expired(), 2);
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.groups, 0);
    }

    #[test]
    fn test_full_group_evicts_oldest() {
        let cache = SignatureCache::new(SignatureCacheConfig {
            max_entries_per_group: 2,
            ..Default::default()
        });
        cache.cache_signature("claude", "first", &sig('1'));
        cache.cache_signature("claude", "second", &sig('2'));
        cache.cache_signature("claude", "third", &sig('3'));

        assert_eq!(cache.get_cached_signature("claude", "first"), None);
        assert_eq!(cache.get_cached_signature("claude", "second"), Some(sig('2')));
        assert_eq!(cache.get_cached_signature("claude", "third"), Some(sig('3')));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = SignatureCache::new(SignatureCacheConfig {
            max_entries_per_group: 2,
            ..Default::default()
        });
        cache.cache_signature("claude", "first", &sig('1'));
        cache.cache_signature("claude", "second", &sig('2'));
        cache.cache_signature("claude", "first", &sig('9'));

        assert_eq!(cache.get_cached_signature("claude", "first"), Some(sig('9')));
        assert_eq!(cache.get_cached_signature("claude", "second"), Some(sig('2')));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_sentinel_fallback() {
        let cache = SignatureCache::default();
        assert_eq!(
            cache.signature_or_sentinel("gemini", "unseen"),
            SKIP_SIGNATURE_SENTINEL
        );
        cache.cache_signature("gemini", "seen", &sig('s'));
        assert_eq!(cache.signature_or_sentinel("gemini", "seen"), sig('s'));
    }

    #[test]
    fn test_custom_min_length() {
        let cache = SignatureCache::new(SignatureCacheConfig {
            min_signature_len: 8,
            ..Default::default()
        });
        assert!(cache.has_valid_signature("claude", "12345678"));
        assert!(!cache.has_valid_signature("claude", "1234567"));
        cache.cache_signature("claude", "text", "12345678");
        assert_eq!(
            cache.get_cached_signature("claude", "text"),
            Some("12345678".to_string())
        );
    }

    #[test]
    fn test_clear_then_insert_is_visible() {
        let cache = SignatureCache::default();
        cache.cache_signature("claude", "a", &sig('a'));
        cache.clear_signature_cache("claude");
        cache.cache_signature("claude", "a", &sig('b'));
        assert_eq!(cache.get_cached_signature("claude", "a"), Some(sig('b')));
    }
}
