use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::Cache;
#[cfg(feature = "stats")]
use crate::CacheStats;

/// Unbounded cache for a single thread.
///
/// Backed by a `RefCell<HashMap>`, so it is neither `Sync` nor locked. It is
/// what `#[memoize(scope = "thread")]` stores in a `thread_local!`, giving
/// every thread its own independent cache with no synchronization cost.
///
/// The map is never borrowed while the compute closure runs, so the closure
/// may re-enter the cache: recursive memoized functions work, and so does
/// calling [`Cache::clear`] from inside a computation.
///
/// # Examples
///
/// ```
/// use memora_core::{Cache, LocalCache};
///
/// thread_local! {
///     static LENGTHS: LocalCache<String, usize> = LocalCache::new();
/// }
///
/// let len = LENGTHS.with(|cache| cache.get_or_add("hello".to_string(), |s| s.len()));
/// assert_eq!(len, 5);
/// ```
pub struct LocalCache<K, V> {
    map: RefCell<HashMap<K, V>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            map: RefCell::new(HashMap::new()),
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.borrow().contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.borrow().get(key).cloned()
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

    fn store(&self, key: K, value: V) -> V
    where
        V: Clone,
    {
        #[cfg(feature = "stats")]
        self.stats.record_computation();
        // A recursive call may have stored this key while we computed.
        self.map.borrow_mut().entry(key).or_insert(value).clone()
    }
}

impl<K, V> Cache<K, V> for LocalCache<K, V>
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
        let value = compute(&key);
        self.store(key, value)
    }

    fn try_get_or_add<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        match compute(&key) {
            Ok(value) => Ok(self.store(key, value)),
            Err(err) => {
                #[cfg(feature = "stats")]
                self.stats.record_computation();
                Err(err)
            }
        }
    }

    fn clear(&self) {
        let dropped = {
            let mut map = self.map.borrow_mut();
            let dropped = map.len();
            map.clear();
            dropped
        };
        tracing::debug!(dropped, "local cache cleared");
    }

    #[cfg(feature = "stats")]
    fn stats(&self) -> Option<&CacheStats> {
        Some(&self.stats)
    }
}

impl<K, V> Default for LocalCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LocalCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCache")
            .field("len", &self.map.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_hit_skips_compute() {
        let cache = LocalCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let value = cache.get_or_add(5, |k| {
                calls.set(calls.get() + 1);
                k * k
            });
            assert_eq!(value, 25);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_recursive_compute() {
        fn fib(cache: &LocalCache<u64, u64>, n: u64) -> u64 {
            cache.get_or_add(n, |&n| {
                if n < 2 {
                    n
                } else {
                    fib(cache, n - 1) + fib(cache, n - 2)
                }
            })
        }

        let cache = LocalCache::new();
        assert_eq!(fib(&cache, 60), 1_548_008_755_920);
        assert_eq!(cache.len(), 61);
    }

    #[test]
    fn test_clear_inside_compute() {
        let cache = LocalCache::new();
        cache.get_or_add(1, |_| 1);

        let value = cache.get_or_add(2, |_| {
            cache.clear();
            2
        });
        assert_eq!(value, 2);
        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&2));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: LocalCache<&str, i32> = LocalCache::new();
        let attempts = Cell::new(0);

        for _ in 0..2 {
            let result: Result<i32, String> = cache.try_get_or_add("x", |_| {
                attempts.set(attempts.get() + 1);
                Err("missing".to_string())
            });
            assert!(result.is_err());
        }
        assert_eq!(attempts.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_each_thread_has_its_own_cache() {
        thread_local! {
            static CACHE: LocalCache<u8, std::thread::ThreadId> = LocalCache::new();
        }

        let here = CACHE.with(|c| c.get_or_add(0, |_| std::thread::current().id()));
        let there = std::thread::spawn(|| {
            CACHE.with(|c| c.get_or_add(0, |_| std::thread::current().id()))
        })
        .join()
        .unwrap();

        assert_ne!(here, there);
        assert_eq!(CACHE.with(|c| c.len()), 1);
    }
}
