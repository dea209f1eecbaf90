//! Explicitly owned caches.
//!
//! [`OnceMap`] builds each key at most once, even under concurrent first
//! access. [`BoundedCache`] keeps a capped number of entries and drops the
//! oldest batch when full; both only ever memoize, so a hit returns exactly
//! what a rebuild would.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default capacity of the per-student profile cache.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default number of entries dropped per eviction.
pub const DEFAULT_EVICTION_BATCH: usize = 100;

/// Decides how many of the oldest entries to drop before an insert.
pub trait EvictionPolicy: Send + Sync {
    /// `len` is the current entry count, `max_entries` the configured cap.
    fn evict_count(&self, len: usize, max_entries: usize) -> usize;
}

/// Drop a fixed batch of the oldest entries once the cache is full.
#[derive(Debug, Clone, Copy)]
pub struct OldestBatch {
    pub batch: usize,
}

impl Default for OldestBatch {
    fn default() -> Self {
        Self {
            batch: DEFAULT_EVICTION_BATCH,
        }
    }
}

impl EvictionPolicy for OldestBatch {
    fn evict_count(&self, len: usize, max_entries: usize) -> usize {
        if len < max_entries {
            0
        } else {
            self.batch.max(1).min(len)
        }
    }
}

/// Hit, miss and eviction counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

struct Entries<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

/// A capacity-bounded cache with insertion-order eviction.
pub struct BoundedCache<K, V> {
    entries: Mutex<Entries<K, V>>,
    max_entries: usize,
    policy: Box<dyn EvictionPolicy>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_entries: usize) -> Self {
        Self::with_policy(max_entries, Box::new(OldestBatch::default()))
    }

    pub fn with_policy(max_entries: usize, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries: max_entries.max(1),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.entries.lock().map.get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.map.get_mut(&key) {
            *slot = value;
            return;
        }

        let evict = self
            .policy
            .evict_count(entries.map.len(), self.max_entries);
        for _ in 0..evict {
            if let Some(oldest) = entries.order.pop_front() {
                entries.map.remove(&oldest);
            }
        }
        if evict > 0 {
            self.evictions.fetch_add(evict as u64, Ordering::Relaxed);
            debug!(evicted = evict, "cache full, dropped oldest entries");
        }

        entries.order.push_back(key.clone());
        entries.map.insert(key, value);
    }

    /// Return the cached value or build, store and return it.
    ///
    /// The builder runs without holding the lock; a failed build caches
    /// nothing.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, build: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = build()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Drop one entry. Returns `true` if it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.entries.lock();
        let removed = entries.map.remove(key).is_some();
        if removed {
            entries.order.retain(|k| k != key);
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.map.clear();
        entries.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

/// Compute-once-per-key map.
///
/// Concurrent first requests for the same key share one build; other keys
/// are never blocked by it.
pub struct OnceMap<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_init<E, F>(&self, key: &K, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(cells.entry(key.clone()).or_default())
        };
        let built = cell.get_or_try_init(|| build().map(Arc::new)).cloned();
        if built.is_err() {
            // Failed keys leave no slot behind; a later success may have raced in.
            let mut cells = self.cells.lock();
            if cells
                .get(key)
                .is_some_and(|c| Arc::ptr_eq(c, &cell) && c.get().is_none())
            {
                cells.remove(key);
            }
        }
        built
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.cells.lock().get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys that finished building.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys holding a slot, built or in progress.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.cells.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn hits_and_misses_are_counted() {
        let cache: BoundedCache<String, u32> = BoundedCache::new(10);
        assert_eq!(cache.get(&"a".to_string()), None);
        cache.insert("a".into(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn full_cache_drops_oldest_batch() {
        let cache = BoundedCache::with_policy(5, Box::new(OldestBatch { batch: 2 }));
        for i in 0..5 {
            cache.insert(i, i * 10);
        }
        cache.insert(5, 50);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get(&0), None);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(20));
        assert_eq!(cache.get(&5), Some(50));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn replacing_a_key_never_evicts() {
        let cache = BoundedCache::with_policy(2, Box::new(OldestBatch { batch: 1 }));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(3));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = BoundedCache::new(DEFAULT_MAX_ENTRIES);
        cache.insert(1, "one");
        cache.insert(2, "two");
        assert!(cache.invalidate(&1));
        assert!(!cache.invalidate(&1));
        assert_eq!(cache.get(&1), None);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(4);
        let failed: Result<u32, &str> = cache.get_or_try_insert_with(&1, || Err("boom"));
        assert!(failed.is_err());
        let built: Result<u32, &str> = cache.get_or_try_insert_with(&1, || Ok(7));
        assert_eq!(built, Ok(7));
        let hit: Result<u32, &str> = cache.get_or_try_insert_with(&1, || Ok(8));
        assert_eq!(hit, Ok(7));
    }

    struct NeverEvict;

    impl EvictionPolicy for NeverEvict {
        fn evict_count(&self, _len: usize, _max_entries: usize) -> usize {
            0
        }
    }

    #[test]
    fn custom_policy() {
        let cache = BoundedCache::with_policy(1, Box::new(NeverEvict));
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn once_map_builds_each_key_once() {
        let map: Arc<OnceMap<String, usize>> = Arc::new(OnceMap::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let map = Arc::clone(&map);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    map.get_or_try_init(&"k".to_string(), || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, ()>(42)
                    })
                    .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(*handle.join().unwrap(), 42);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn once_map_retries_after_failure() {
        let map: OnceMap<u8, u8> = OnceMap::new();
        assert!(map.get_or_try_init(&1, || Err::<u8, _>("nope")).is_err());
        assert!(map.get(&1).is_none());
        assert_eq!(*map.get_or_try_init(&1, || Ok::<_, &str>(9)).unwrap(), 9);
    }

    #[test]
    fn once_map_failures_leave_no_slots() {
        let map: OnceMap<u32, u32> = OnceMap::new();
        for key in 0..100 {
            assert!(map.get_or_try_init(&key, || Err::<u32, _>("unknown")).is_err());
        }
        assert_eq!(map.slot_count(), 0);
        map.get_or_try_init(&7, || Ok::<_, &str>(70)).unwrap();
        assert_eq!(map.slot_count(), 1);
        assert_eq!(map.len(), 1);
    }
}
