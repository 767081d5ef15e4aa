use std::sync::Arc;

#[cfg(feature = "stats")]
use crate::CacheStats;

/// Storage backend used by memoized functions.
///
/// A `Cache` maps keys to values and exposes a single "get the existing value
/// or compute and store it" operation plus a reset. The memoizer only ever
/// talks to this trait, so any storage policy (unbounded, bounded, a mock in
/// tests) can be substituted at construction time.
///
/// # Contract
///
/// * `get_or_add` returns the stored value for `key` without calling
///   `compute` when one exists. Otherwise it calls `compute(&key)`, stores
///   the result and returns the stored value.
/// * Once a value is stored for a key it is never replaced by a different
///   result for that key. Under a race the first stored value wins.
/// * A panic inside `compute` stores nothing.
/// * `try_get_or_add` stores `Ok` values only. An `Err` is handed back to
///   the caller and the next call for the same key computes again.
/// * `clear` removes every entry.
///
/// Thread safety is a property of the implementation: [`LimitlessCache`] and
/// [`SingleFlightCache`] are `Sync`, [`LocalCache`] is meant for one thread.
///
/// [`LimitlessCache`]: crate::LimitlessCache
/// [`SingleFlightCache`]: crate::SingleFlightCache
/// [`LocalCache`]: crate::LocalCache
///
/// # Examples
///
/// A custom backend only needs the three operations:
///
/// ```
/// use memora_core::Cache;
/// use std::cell::RefCell;
/// use std::collections::BTreeMap;
///
/// struct OrderedCache(RefCell<BTreeMap<u32, u64>>);
///
/// impl Cache<u32, u64> for OrderedCache {
///     fn get_or_add<F>(&self, key: u32, compute: F) -> u64
///     where
///         F: FnOnce(&u32) -> u64,
///     {
///         if let Some(value) = self.0.borrow().get(&key).copied() {
///             return value;
///         }
///         let value = compute(&key);
///         *self.0.borrow_mut().entry(key).or_insert(value)
///     }
///
///     fn try_get_or_add<E, F>(&self, key: u32, compute: F) -> Result<u64, E>
///     where
///         F: FnOnce(&u32) -> Result<u64, E>,
///     {
///         if let Some(value) = self.0.borrow().get(&key).copied() {
///             return Ok(value);
///         }
///         let value = compute(&key)?;
///         Ok(*self.0.borrow_mut().entry(key).or_insert(value))
///     }
///
///     fn clear(&self) {
///         self.0.borrow_mut().clear();
///     }
/// }
///
/// let cache = OrderedCache(RefCell::new(BTreeMap::new()));
/// assert_eq!(cache.get_or_add(3, |k| u64::from(*k) * 10), 30);
/// assert_eq!(cache.get_or_add(3, |_| unreachable!()), 30);
/// ```
pub trait Cache<K, V> {
    /// Returns the value stored for `key`, computing and storing it first if
    /// the key is absent.
    fn get_or_add<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V;

    /// Fallible variant of [`Cache::get_or_add`]. Only `Ok` values are
    /// stored.
    fn try_get_or_add<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>;

    /// Removes every entry.
    fn clear(&self);

    /// Hit/miss statistics for this cache, if it tracks any.
    #[cfg(feature = "stats")]
    fn stats(&self) -> Option<&CacheStats> {
        None
    }
}

impl<K, V, C> Cache<K, V> for &C
where
    C: Cache<K, V>,
{
    #[inline]
    fn get_or_add<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        (**self).get_or_add(key, compute)
    }

    #[inline]
    fn try_get_or_add<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        (**self).try_get_or_add(key, compute)
    }

    #[inline]
    fn clear(&self) {
        (**self).clear()
    }

    #[cfg(feature = "stats")]
    fn stats(&self) -> Option<&CacheStats> {
        (**self).stats()
    }
}

impl<K, V, C> Cache<K, V> for Arc<C>
where
    C: Cache<K, V>,
{
    #[inline]
    fn get_or_add<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        (**self).get_or_add(key, compute)
    }

    #[inline]
    fn try_get_or_add<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        (**self).try_get_or_add(key, compute)
    }

    #[inline]
    fn clear(&self) {
        (**self).clear()
    }

    #[cfg(feature = "stats")]
    fn stats(&self) -> Option<&CacheStats> {
        (**self).stats()
    }
}
