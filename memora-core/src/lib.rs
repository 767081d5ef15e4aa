//! # Memora Core
//!
//! Runtime pieces of the memora memoization library.
//!
//! A memoized function is a pair of a function and a [`Cache`]. Each call
//! turns its arguments into a key ([`MemoFn`]) and asks the cache for the
//! stored value, computing it on a miss.
//!
//! ## Module Organization
//!
//! - [`Cache`] - the storage trait: `get_or_add`, `try_get_or_add`, `clear`
//! - [`LimitlessCache`] - default unbounded, thread-safe cache on `dashmap`
//! - [`SingleFlightCache`] - unbounded cache computing at most once per key
//! - [`LocalCache`] - unbounded single-thread cache for `thread_local!` use
//! - [`MemoFn`] - composite key construction for functions of 0 to 8 arguments
//! - [`memoize`], [`memoize_with`], [`try_memoize`] and [`Memoized`] - the combinator
//! - [`CacheStats`] and [`stats_registry`] - hit/miss counters (`stats` feature)
//!
//! ## Quick Start
//!
//! ```
//! use memora_core::{memoize, Cache};
//!
//! let add = memoize(|a: i64, b: i64| a + b);
//!
//! assert_eq!(add.call((1, 2)), 3);
//! assert_eq!(add.call((2, 1)), 3);
//!
//! // Argument order matters: two entries were stored.
//! assert_eq!(add.cache().len(), 2);
//! ```
//!
//! ## Choosing a guarantee
//!
//! Under concurrent calls for the same missing key, [`LimitlessCache`] may
//! run the function more than once but every caller gets the single stored
//! value. [`SingleFlightCache`] runs it exactly once and makes the other
//! callers wait for that key.
mod cache;
mod keys;
mod limitless_cache;
mod local_cache;
mod memoize;
mod single_flight_cache;

#[cfg(feature = "stats")]
mod stats;

#[cfg(feature = "stats")]
pub mod stats_registry;

pub use cache::Cache;
pub use keys::MemoFn;
pub use limitless_cache::LimitlessCache;
pub use local_cache::LocalCache;
pub use memoize::{memoize, memoize_with, try_memoize, Memoized};
pub use single_flight_cache::SingleFlightCache;

#[cfg(feature = "stats")]
pub use stats::{CacheStats, StatsSnapshot};

/// Support code for `#[memoize]` expansions, reached through the `memora`
/// facade. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;

    use crate::Cache;

    /// Names the success type of a `Result` alias written without
    /// arguments, such as `std::fmt::Result`.
    pub trait Fallible {
        type Value;
    }

    impl<T, E> Fallible for Result<T, E> {
        type Value = T;
    }

    /// Registers the statistics of a macro-generated global cache.
    pub fn register<K, V, C>(name: &str, cache: &'static C)
    where
        C: Cache<K, V>,
    {
        #[cfg(feature = "stats")]
        if let Some(stats) = cache.stats() {
            crate::stats_registry::register(name, stats);
        }
        #[cfg(not(feature = "stats"))]
        let _ = (name, cache);
    }
}
