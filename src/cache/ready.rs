//! LRU-bounded set of IPs with enough recent history to be "ready" for retrieval.

use hashlink::LruCache;

/// Bounded set of IPs that currently satisfy the `history_min` readiness
/// condition. Backed by `hashlink::LruCache`, which evicts the
/// least-recently-used key once `capacity` is exceeded.
pub struct ReadyIpCache {
    inner: LruCache<String, ()>,
}

impl ReadyIpCache {
    pub fn new(capacity: usize) -> Self {
        ReadyIpCache {
            inner: LruCache::new(capacity.max(1)),
        }
    }

    pub fn mark_ready(&mut self, ip: &str) {
        self.inner.insert(ip.to_string(), ());
    }

    /// True if `ip` is ready. Counts as a "use" for LRU purposes, matching
    /// Python's `cachetools.LRUCache.__contains__`, which does not touch
    /// recency — so this reads without promoting, unlike [`Self::take`].
    pub fn contains(&self, ip: &str) -> bool {
        self.inner.peek(ip).is_some()
    }

    /// Removes `ip` from the ready set, if present.
    pub fn remove(&mut self, ip: &str) {
        self.inner.remove(ip);
    }

    /// Snapshot of the currently ready IPs, in unspecified order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_contains() {
        let mut cache = ReadyIpCache::new(10);
        cache.mark_ready("1.1.1.1");
        assert!(cache.contains("1.1.1.1"));
        assert!(!cache.contains("2.2.2.2"));
    }

    #[test]
    fn remove_clears_membership() {
        let mut cache = ReadyIpCache::new(10);
        cache.mark_ready("1.1.1.1");
        cache.remove("1.1.1.1");
        assert!(!cache.contains("1.1.1.1"));
    }

    #[test]
    fn overflow_evicts_least_recently_used() {
        let mut cache = ReadyIpCache::new(2);
        cache.mark_ready("a");
        cache.mark_ready("b");
        cache.mark_ready("c");
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
    }

    #[test]
    fn find_candidates_returns_all_keys() {
        let mut cache = ReadyIpCache::new(10);
        cache.mark_ready("a");
        cache.mark_ready("b");
        let mut keys = cache.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
