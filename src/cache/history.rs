//! TTL-bounded per-IP window history.
//!
//! The source behaviour this mirrors (`cachetools.TTLCache` with
//! `getsizeof=len`) bounds the cache by the *total number of history entries
//! across all keys*, not by key count, and evicts expired whole-key entries
//! before falling back to the least-recently-inserted key. We reproduce both
//! properties on top of a `hashlink::LinkedHashMap`, which preserves
//! insertion order the same way the source's backing `OrderedDict` does.

use std::collections::VecDeque;

use hashlink::LinkedHashMap;

use crate::types::WindowHistoryEntry;

struct HistoryBucket {
    /// Packet-time (ns) at which this bucket was first created. Set once and never
    /// refreshed by later appends, matching `cachetools.TTLCache` (only a fresh
    /// `__setitem__`, not an in-place append, resets a key's TTL). The cache's TTL
    /// clock is the latest observed packet timestamp, not wall-clock time: see
    /// the design notes on why this diverges from the source's `time.monotonic()`.
    inserted_at_ns: u64,
    windows: VecDeque<WindowHistoryEntry>,
}

/// Bounded, TTL-evicting store of `ip -> [WindowHistoryEntry]`.
pub struct WindowHistoryCache {
    max_entries: u64,
    timeout_ns: u64,
    buckets: LinkedHashMap<String, HistoryBucket>,
    total_entries: u64,
}

impl WindowHistoryCache {
    pub fn new(max_entries: u64, timeout_ns: u64) -> Self {
        WindowHistoryCache {
            max_entries,
            timeout_ns,
            buckets: LinkedHashMap::new(),
            total_entries: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// Appends `entry` to `ip`'s history, creating (or replacing, if expired) the
    /// bucket as needed, and evicting other entries to stay within `max_entries`.
    /// Returns the up-to-date list for `ip`.
    pub fn push(
        &mut self,
        ip: &str,
        entry: WindowHistoryEntry,
        now_ns: u64,
    ) -> &VecDeque<WindowHistoryEntry> {
        self.purge_expired(now_ns);
        if self.buckets.get(ip).is_none() {
            self.evict_to_fit(1, now_ns);
        }

        let bucket = self.buckets.entry(ip.to_string()).or_insert_with(|| HistoryBucket {
            inserted_at_ns: now_ns,
            windows: VecDeque::new(),
        });
        bucket.windows.push_back(entry);
        self.total_entries += 1;

        &self.buckets.get(ip).expect("just inserted").windows
    }

    /// Returns `ip`'s history if present and not expired. Expired entries read as
    /// absent and are purged as a side effect, matching `cachetools.TTLCache`.
    pub fn get(&mut self, ip: &str, now_ns: u64) -> Option<&VecDeque<WindowHistoryEntry>> {
        if self.is_expired(ip, now_ns) {
            self.remove(ip);
            return None;
        }
        self.buckets.get(ip).map(|b| &b.windows)
    }

    /// Truncates `ip`'s history to at most its last `keep` entries.
    pub fn truncate_to_last(&mut self, ip: &str, keep: usize) {
        if let Some(bucket) = self.buckets.get_mut(ip) {
            while bucket.windows.len() > keep {
                bucket.windows.pop_front();
                self.total_entries = self.total_entries.saturating_sub(1);
            }
        }
    }

    /// Removes and returns `ip`'s history, regardless of expiry.
    pub fn remove(&mut self, ip: &str) -> Option<VecDeque<WindowHistoryEntry>> {
        let bucket = self.buckets.remove(ip)?;
        self.total_entries = self.total_entries.saturating_sub(bucket.windows.len() as u64);
        Some(bucket.windows)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.total_entries = 0;
    }

    fn is_expired(&self, ip: &str, now_ns: u64) -> bool {
        match self.buckets.get(ip) {
            Some(bucket) => now_ns.saturating_sub(bucket.inserted_at_ns) >= self.timeout_ns,
            None => false,
        }
    }

    /// Drops every bucket whose TTL has elapsed.
    fn purge_expired(&mut self, now_ns: u64) {
        let expired: Vec<String> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| now_ns.saturating_sub(bucket.inserted_at_ns) >= self.timeout_ns)
            .map(|(ip, _)| ip.clone())
            .collect();
        for ip in expired {
            self.remove(&ip);
        }
    }

    /// Makes room for `incoming` additional entries, evicting whole keys — oldest
    /// insertion order first — until the bound is satisfied.
    fn evict_to_fit(&mut self, incoming: u64, now_ns: u64) {
        self.purge_expired(now_ns);
        while self.total_entries + incoming > self.max_entries {
            let oldest = match self.buckets.keys().next() {
                Some(k) => k.clone(),
                None => break,
            };
            self.remove(&oldest);
        }
    }
}
