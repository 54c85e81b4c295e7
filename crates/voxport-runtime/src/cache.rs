use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

struct Entries<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

/// Session-scoped memo shared by all workers: one exclusive lock, FIFO eviction past `capacity`.
///
/// Values are computed outside the lock, so two workers racing on a fresh key may both
/// compute it; the first insert wins.
pub struct SessionCache<K, V> {
    entries: Mutex<Entries<K, V>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> SessionCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.lock().map.get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Inserts unless the key is already present; returns the cached value either way.
    pub fn insert(&self, key: K, value: V) -> V {
        let mut entries = self.lock();
        if let Some(existing) = entries.map.get(&key) {
            return existing.clone();
        }
        entries.map.insert(key.clone(), value.clone());
        entries.order.push_back(key);
        let mut evicted = 0u64;
        while entries.order.len() > self.capacity {
            if let Some(old) = entries.order.pop_front() {
                entries.map.remove(&old);
                evicted += 1;
            }
        }
        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }
        value
    }

    /// Cached value of `key`, computing it with `make` on a miss. `make` runs unlocked.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let value = make();
        self.insert(key, value)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.lock().map.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_and_misses() {
        let cache: SessionCache<u32, &str> = SessionCache::new(4);
        assert_eq!(cache.get_or_insert_with(1, || "one"), "one");
        assert_eq!(cache.get_or_insert_with(1, || "uno"), "one");
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.entries), (1, 1, 1));
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let cache: SessionCache<u32, u32> = SessionCache::new(2);
        for k in 0..3 {
            cache.insert(k, k * 10);
        }
        assert_eq!(cache.get(&0), None);
        assert_eq!(cache.get(&2), Some(20));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn first_insert_wins() {
        let cache: SessionCache<&str, u8> = SessionCache::new(8);
        assert_eq!(cache.insert("k", 1), 1);
        assert_eq!(cache.insert("k", 2), 1);
    }
}
