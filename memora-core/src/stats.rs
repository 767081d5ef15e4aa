use std::sync::atomic::{AtomicU64, Ordering};

/// Access counters for a single cache.
///
/// Three counters are kept with `Relaxed` atomics:
///
/// * `hits` - lookups answered from stored values
/// * `misses` - lookups that found nothing stored
/// * `computations` - times the wrapped function actually ran
///
/// `computations` differs from `misses` when a computation fails (the miss
/// is counted, the failed run is counted, nothing is stored) and, for
/// [`SingleFlightCache`](crate::SingleFlightCache), when racing callers wait
/// on a single run.
///
/// # Examples
///
/// ```
/// use memora_core::CacheStats;
///
/// let stats = CacheStats::new();
/// stats.record_miss();
/// stats.record_computation();
/// stats.record_hit();
/// stats.record_hit();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert_eq!(stats.computations(), 1);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one run of the wrapped function, successful or not.
    #[inline]
    pub fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Hits plus misses.
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of accesses served from the cache, `0.0` when there were no
    /// accesses.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// Copies the current counter values.
    ///
    /// The three loads are independent, so a snapshot taken while other
    /// threads are calling the cache may be off by the calls in flight.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            computations: self.computations(),
        }
    }

    /// Sets every counter back to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.computations.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of a [`CacheStats`].
///
/// ```
/// use memora_core::CacheStats;
///
/// let stats = CacheStats::new();
/// stats.record_miss();
/// let before = stats.snapshot();
///
/// stats.record_hit();
/// assert_eq!(before.hits, 0);
/// assert_eq!(stats.snapshot().hits, 1);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub computations: u64,
}

impl StatsSnapshot {
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        match self.total_accesses() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    pub fn miss_rate(&self) -> f64 {
        match self.total_accesses() {
            0 => 0.0,
            total => self.misses as f64 / total as f64,
        }
    }
}
