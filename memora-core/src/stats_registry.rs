//! Name-indexed registry of cache statistics.
//!
//! Every `#[memoize]` function with global scope registers its cache here on
//! first call, under the function name or the `name = "..."` attribute.
//! Caches built by hand can be registered with [`register`] as long as they
//! live for `'static`.
//!
//! ```
//! use memora_core::{stats_registry, Cache, LimitlessCache};
//! use once_cell::sync::Lazy;
//!
//! static SQUARES: Lazy<LimitlessCache<u64, u64>> = Lazy::new(LimitlessCache::new);
//!
//! if let Some(stats) = SQUARES.stats() {
//!     stats_registry::register("squares", stats);
//! }
//! SQUARES.get_or_add(4, |n| n * n);
//!
//! let snapshot = stats_registry::get("squares").unwrap();
//! assert_eq!(snapshot.misses, 1);
//! ```
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{CacheStats, StatsSnapshot};

static STATS_REGISTRY: Lazy<RwLock<HashMap<String, &'static CacheStats>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers `stats` under `name`, replacing any previous registration with
/// the same name.
pub fn register(name: &str, stats: &'static CacheStats) {
    let previous = STATS_REGISTRY.write().insert(name.to_string(), stats);
    if previous.is_some() {
        tracing::debug!(name, "replaced registered cache statistics");
    }
}

/// Snapshot of the statistics registered under `name`.
pub fn get(name: &str) -> Option<StatsSnapshot> {
    STATS_REGISTRY.read().get(name).map(|stats| stats.snapshot())
}

/// Live statistics registered under `name`.
pub fn get_ref(name: &str) -> Option<&'static CacheStats> {
    STATS_REGISTRY.read().get(name).copied()
}

/// Names of all registered caches, in no particular order.
pub fn list() -> Vec<String> {
    STATS_REGISTRY.read().keys().cloned().collect()
}

/// Zeroes the counters registered under `name`. Returns `false` if the name
/// is unknown.
pub fn reset(name: &str) -> bool {
    match STATS_REGISTRY.read().get(name) {
        Some(stats) => {
            stats.reset();
            true
        }
        None => false,
    }
}

/// Forgets every registration. The counters themselves are untouched.
pub fn clear() {
    STATS_REGISTRY.write().clear();
}
