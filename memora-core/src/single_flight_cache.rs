use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::Cache;
#[cfg(feature = "stats")]
use crate::CacheStats;

type Slot<V> = Arc<OnceCell<V>>;

/// A caller's hold on a slot while it computes.
///
/// On drop, a slot that is still empty (the computation failed or panicked)
/// is removed from the map once no other caller holds it, so failing keys do
/// not accumulate. Callers still waiting on the slot keep it alive and the
/// last one out removes it.
struct SlotGuard<'a, K, V>
where
    K: Eq + Hash,
{
    slots: &'a DashMap<K, Slot<V>>,
    key: &'a K,
    slot: Slot<V>,
}

impl<K, V> Drop for SlotGuard<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if self.slot.get().is_some() {
            return;
        }

        let slot = std::mem::take(&mut self.slot);
        let ptr = Arc::as_ptr(&slot);
        drop(slot);
        // Slots are only cloned under the shard lock held by `remove_if`, so
        // a count of one means only the map still refers to it.
        let removed = self.slots.remove_if(self.key, |_, current| {
            Arc::as_ptr(current) == ptr
                && current.get().is_none()
                && Arc::strong_count(current) == 1
        });
        if removed.is_some() {
            tracing::trace!("removed empty slot after failed computation");
        }
    }
}

/// An unbounded cache that runs the compute closure at most once per key,
/// even when many threads ask for the same missing key at the same time.
///
/// Every key owns a slot (`Arc<OnceCell<V>>`) in a [`DashMap`]. The map lock
/// is only held while the slot is looked up or created; the computation then
/// runs inside the slot's `OnceCell`, so callers racing on the same key block
/// on that key alone while callers on other keys proceed.
///
/// If the computing caller panics or its fallible computation returns `Err`,
/// the slot stays empty and the next caller (possibly one that was waiting)
/// computes again.
///
/// A computation must not ask the same cache for its *own* key: that
/// re-enters the slot it is initialising and blocks forever. Recursing into
/// other keys is fine.
///
/// Keys must be `Clone` because a key is kept in the map while the caller's
/// copy is handed to the computation.
///
/// # Examples
///
/// ```
/// use memora_core::{Cache, SingleFlightCache};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::thread;
///
/// let cache = Arc::new(SingleFlightCache::new());
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let cache = Arc::clone(&cache);
///         let runs = Arc::clone(&runs);
///         thread::spawn(move || {
///             cache.get_or_add("config", |_| {
///                 runs.fetch_add(1, Ordering::SeqCst);
///                 "loaded".to_string()
///             })
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), "loaded");
/// }
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
pub struct SingleFlightCache<K, V> {
    slots: DashMap<K, Slot<V>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: DashMap::with_capacity(capacity),
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        }
    }

    /// Number of keys holding a value. Keys whose computation is still
    /// running or has failed are not counted.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .count()
    }

    /// Stops at the first key holding a value.
    pub fn is_empty(&self) -> bool {
        !self.slots.iter().any(|slot| slot.value().get().is_some())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.slots
            .get(key)
            .map_or(false, |slot| slot.value().get().is_some())
    }

    /// Returns a copy of the stored value without computing or waiting.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.slots
            .get(key)
            .and_then(|slot| slot.value().get().cloned())
    }

    fn slot(&self, key: &K) -> Slot<V> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }

    /// Fetches the slot for `key` and, if it already holds a value, returns
    /// that value as well. Records the hit or miss.
    fn lookup(&self, key: &K) -> (Slot<V>, Option<V>)
    where
        V: Clone,
    {
        let slot = self.slot(key);
        let found = slot.get().cloned();
        #[cfg(feature = "stats")]
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        (slot, found)
    }

    fn computed(&self) {
        #[cfg(feature = "stats")]
        self.stats.record_computation();
    }

    fn guard<'a>(&'a self, key: &'a K, slot: Slot<V>) -> SlotGuard<'a, K, V> {
        SlotGuard {
            slots: &self.slots,
            key,
            slot,
        }
    }
}

impl<K, V> Cache<K, V> for SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn get_or_add<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        let (slot, found) = self.lookup(&key);
        if let Some(value) = found {
            return value;
        }

        let guard = self.guard(&key, slot);
        guard
            .slot
            .get_or_init(|| {
                tracing::trace!("single-flight cache miss, computing");
                self.computed();
                compute(&key)
            })
            .clone()
    }

    fn try_get_or_add<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let (slot, found) = self.lookup(&key);
        if let Some(value) = found {
            return Ok(value);
        }

        let guard = self.guard(&key, slot);
        guard
            .slot
            .get_or_try_init(|| {
                tracing::trace!("single-flight cache miss, computing");
                self.computed();
                compute(&key)
            })
            .map(Clone::clone)
    }

    fn clear(&self) {
        let dropped = self.slots.len();
        self.slots.clear();
        tracing::debug!(dropped, "single-flight cache cleared");
    }

    #[cfg(feature = "stats")]
    fn stats(&self) -> Option<&CacheStats> {
        Some(&self.stats)
    }
}

impl<K, V> Default for SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}
