//! # Memora
//!
//! Function memoization for Rust: wrap a pure function so that repeated
//! calls with the same arguments return a stored result instead of running
//! the function again.
//!
//! ## Features
//!
//! - **Combinator**: [`memoize`] / [`memoize_with`] wrap any function or
//!   closure of 0 to 8 arguments
//! - **Attribute**: `#[memoize]` memoizes a free function behind a static cache
//! - **Pluggable storage**: anything implementing [`Cache`] can back a
//!   memoized function
//! - **Thread-safe defaults**: [`LimitlessCache`] (dashmap, unbounded) and
//!   [`SingleFlightCache`] (at most one computation per key)
//! - **Result-aware**: fallible functions cache only `Ok` values
//! - **Statistics**: hit/miss/computation counters behind the `stats` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use memora::memoize;
//!
//! #[memoize]
//! fn fibonacci(n: u64) -> u64 {
//!     if n < 2 {
//!         return n;
//!     }
//!     fibonacci(n - 1) + fibonacci(n - 2)
//! }
//!
//! assert_eq!(fibonacci(90), 2_880_067_194_370_816_120);
//! ```
//!
//! The attribute and the combinator share a name but live in different
//! namespaces; the combinator is also available as [`memoize_fn`]:
//!
//! ```rust
//! use memora::{memoize_fn, Cache};
//!
//! let add = memoize_fn(|a: i32, b: i32| a + b);
//! assert_eq!(add.call((1, 2)), 3);
//! assert_eq!(add.call((2, 1)), 3);
//! assert_eq!(add.cache().len(), 2);
//!
//! add.cache().clear();
//! assert!(add.cache().is_empty());
//! ```
//!
//! ## Sharing a Cache
//!
//! ```rust
//! use memora::{memoize_with, SingleFlightCache};
//! use std::sync::Arc;
//!
//! let cache = Arc::new(SingleFlightCache::new());
//! let shout = memoize_with(|s: String| s.to_uppercase(), Arc::clone(&cache));
//! let whisper = memoize_with(|s: String| s.to_lowercase(), Arc::clone(&cache));
//!
//! assert_eq!(shout.call(("Hi".to_string(),)), "HI");
//! // Same key, same cache: the stored value wins.
//! assert_eq!(whisper.call(("Hi".to_string(),)), "HI");
//! ```
//!
//! ## Error Handling
//!
//! Functions returning `Result<T, E>` only cache successful results:
//!
//! ```rust
//! use memora::memoize;
//!
//! #[memoize]
//! fn divide(a: i32, b: i32) -> Result<i32, String> {
//!     if b == 0 {
//!         Err("Division by zero".to_string())
//!     } else {
//!         Ok(a / b)
//!     }
//! }
//!
//! assert_eq!(divide(10, 2), Ok(5));
//! // Err results are NOT cached
//! assert!(divide(10, 0).is_err());
//! ```

pub use memora_core::*;
pub use memora_macros::memoize;

/// The [`memoize`](memora_core::memoize()) combinator under a name that does
/// not collide with the `#[memoize]` attribute in glob imports.
pub use memora_core::memoize as memoize_fn;
