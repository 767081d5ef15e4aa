use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;

use crate::Cache;
#[cfg(feature = "stats")]
use crate::CacheStats;

/// The default, unbounded, thread-safe cache.
///
/// Entries are kept in a [`DashMap`] with no capacity bound and no eviction;
/// they stay until [`Cache::clear`] is called or the cache is dropped.
///
/// # Concurrency
///
/// * Lookups and inserts for different keys only contend when the keys land
///   on the same dashmap shard, and only for the duration of the lookup or
///   insert.
/// * The compute closure runs with no lock held, so a memoized function may
///   call itself recursively through the same cache.
/// * Two callers racing on the same absent key may both compute. The first
///   insert wins and every racer returns the stored value, so all callers
///   agree on one value per key. Use
///   [`SingleFlightCache`](crate::SingleFlightCache) when the function must
///   run at most once per key.
///
/// # Examples
///
/// ```
/// use memora_core::{Cache, LimitlessCache};
///
/// let cache = LimitlessCache::new();
/// assert_eq!(cache.get_or_add(2, |n| n * 21), 42);
/// assert_eq!(cache.get_or_add(2, |_| unreachable!()), 42);
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
pub struct LimitlessCache<K, V> {
    map: DashMap<K, V>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<K, V> LimitlessCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty cache with room for at least `capacity` entries
    /// before reallocating. The capacity is not a limit.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity(capacity),
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns a copy of the stored value without computing anything and
    /// without touching the statistics.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn lookup(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let found = self.get(key);
        #[cfg(feature = "stats")]
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    fn computed(&self) {
        #[cfg(feature = "stats")]
        self.stats.record_computation();
    }

    /// Stores `value` unless a racing caller stored one first, and returns
    /// whichever value ended up in the map.
    fn store(&self, key: K, value: V) -> V
    where
        V: Clone,
    {
        self.map.entry(key).or_insert(value).value().clone()
    }
}

impl<K, V> Cache<K, V> for LimitlessCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get_or_add<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }

        tracing::trace!("limitless cache miss, computing");
        let value = compute(&key);
        self.computed();
        self.store(key, value)
    }

    fn try_get_or_add<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }

        tracing::trace!("limitless cache miss, computing");
        let result = compute(&key);
        self.computed();
        match result {
            Ok(value) => Ok(self.store(key, value)),
            Err(err) => {
                tracing::trace!("computation failed, nothing stored");
                Err(err)
            }
        }
    }

    fn clear(&self) {
        let dropped = self.map.len();
        self.map.clear();
        tracing::debug!(dropped, "limitless cache cleared");
    }

    #[cfg(feature = "stats")]
    fn stats(&self) -> Option<&CacheStats> {
        Some(&self.stats)
    }
}

impl<K, V> Default for LimitlessCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LimitlessCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitlessCache")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_hit_skips_compute() {
        let cache = LimitlessCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_add("key", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            10
        });
        let second = cache.get_or_add("key", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            20
        });

        assert_eq!((first, second), (10, 10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_compute_receives_key() {
        let cache = LimitlessCache::new();
        let value = cache.get_or_add((3, 4), |&(a, b)| a * b);
        assert_eq!(value, 12);
        assert_eq!(cache.get(&(3, 4)), Some(12));
    }

    #[test]
    fn test_clear_forces_recompute() {
        let cache = LimitlessCache::new();
        cache.get_or_add(1, |_| "old".to_string());
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get_or_add(1, |_| "new".to_string()), "new");
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: LimitlessCache<u32, u32> = LimitlessCache::new();

        let failed: Result<u32, String> = cache.try_get_or_add(7, |_| Err("nope".into()));
        assert!(failed.is_err());
        assert!(!cache.contains_key(&7));

        let ok: Result<u32, String> = cache.try_get_or_add(7, |k| Ok(k + 1));
        assert_eq!(ok, Ok(8));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_panic_stores_nothing() {
        let cache: LimitlessCache<u32, u32> = LimitlessCache::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            cache.get_or_add(1, |_| panic!("compute failed"));
        }));
        assert!(outcome.is_err());
        assert!(cache.is_empty());

        assert_eq!(cache.get_or_add(1, |k| k * 5), 5);
    }

    #[test]
    fn test_recursive_compute_does_not_deadlock() {
        fn fib(cache: &LimitlessCache<u64, u64>, n: u64) -> u64 {
            cache.get_or_add(n, |&n| {
                if n < 2 {
                    n
                } else {
                    fib(cache, n - 1) + fib(cache, n - 2)
                }
            })
        }

        let cache = LimitlessCache::new();
        assert_eq!(fib(&cache, 80), 23_416_728_348_467_685);
        assert_eq!(cache.len(), 81);
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        let cache = Arc::new(LimitlessCache::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = t * 1000 + i;
                        assert_eq!(cache.get_or_add(key, |k| k * 2), key * 2);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 800);
    }

    #[test]
    fn test_same_key_race_agrees_on_one_value() {
        let cache = Arc::new(LimitlessCache::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8usize)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    // Each racer would compute a different value; only one may win.
                    cache.get_or_add("shared", |_| t)
                })
            })
            .collect();

        let seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.get(&"shared").unwrap();
        assert!(seen.iter().all(|&v| v == stored));
        assert_eq!(cache.len(), 1);
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats_track_hits_misses_and_computations() {
        let cache: LimitlessCache<u8, u8> = LimitlessCache::new();
        cache.get_or_add(1, |k| *k);
        cache.get_or_add(1, |k| *k);
        let _: Result<u8, ()> = cache.try_get_or_add(2, |_| Err(()));

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 2);
        assert_eq!(stats.computations(), 2);
    }
}
