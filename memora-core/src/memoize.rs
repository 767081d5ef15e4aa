use std::fmt;
use std::marker::PhantomData;

use crate::{Cache, LimitlessCache, MemoFn};

/// Memoizes `func` with a fresh [`LimitlessCache`].
///
/// Same as `memoize_with(func, LimitlessCache::new())`. Closure arguments
/// need type annotations, since the arity is picked from the closure's
/// signature.
///
/// The whole return value is cached. For a function returning `Result`
/// that includes `Err` values; use [`try_memoize`] and
/// [`Memoized::try_call`] to cache only `Ok`.
///
/// # Examples
///
/// ```
/// use memora_core::memoize;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let calls = AtomicUsize::new(0);
/// let inc = memoize(|x: u32| {
///     calls.fetch_add(1, Ordering::SeqCst);
///     x + 1
/// });
///
/// assert_eq!(inc.call((1,)), 2);
/// assert_eq!(inc.call((1,)), 2);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
///
/// assert_eq!(inc.call((2,)), 3);
/// assert_eq!(calls.load(Ordering::SeqCst), 2);
/// ```
pub fn memoize<Args, F>(func: F) -> Memoized<F, LimitlessCache<F::Key, F::Output>, Args>
where
    F: MemoFn<Args>,
{
    memoize_with(func, LimitlessCache::new())
}

/// Memoizes a fallible `func` with a fresh [`LimitlessCache`] holding only
/// its `Ok` values.
///
/// Use [`Memoized::try_call`] on the result; errors are returned to the
/// caller and never stored.
///
/// ```
/// use memora_core::try_memoize;
///
/// let parse = try_memoize(|s: String| s.parse::<i32>());
///
/// assert!(parse.try_call(("x".to_string(),)).is_err());
/// assert_eq!(parse.try_call(("7".to_string(),)), Ok(7));
/// assert_eq!(parse.cache().len(), 1);
/// ```
pub fn try_memoize<Args, F, T, E>(func: F) -> Memoized<F, LimitlessCache<F::Key, T>, Args>
where
    F: MemoFn<Args, Output = Result<T, E>>,
{
    memoize_with(func, LimitlessCache::new())
}

/// Memoizes `func` with a caller-supplied cache.
///
/// Pass `&cache` or an `Arc` to share one cache between several memoized
/// functions, or to keep a handle for [`Cache::clear`].
///
/// # Examples
///
/// ```
/// use memora_core::{memoize_with, Cache, SingleFlightCache};
/// use std::sync::Arc;
///
/// let cache = Arc::new(SingleFlightCache::new());
/// let area = memoize_with(|w: u32, h: u32| w * h, Arc::clone(&cache));
///
/// assert_eq!(area.call((3, 4)), 12);
/// assert_eq!(cache.get(&(3, 4)), Some(12));
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
pub fn memoize_with<Args, F, C>(func: F, cache: C) -> Memoized<F, C, Args>
where
    F: MemoFn<Args>,
{
    Memoized {
        func,
        cache,
        _args: PhantomData,
    }
}

/// A function bound to a cache.
///
/// Built by [`memoize`] or [`memoize_with`]. Calls take the arguments as a
/// tuple, `(x,)` for one argument, `(a, b)` for two and so on; the tuple is
/// turned into the cache key by [`MemoFn::compose`].
///
/// `Memoized` is `Send`/`Sync` whenever the function and the cache are, so a
/// memoized function over a thread-safe cache can be shared through an
/// `Arc` or a `static`.
pub struct Memoized<F, C, Args> {
    func: F,
    cache: C,
    _args: PhantomData<fn(Args)>,
}

impl<F, C, Args> Memoized<F, C, Args> {
    /// The cache backing this function.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Splits into the original function and its cache.
    pub fn into_parts(self) -> (F, C) {
        (self.func, self.cache)
    }
}

impl<F, C, Args> Memoized<F, C, Args>
where
    F: MemoFn<Args>,
{
    /// Calls the function through the cache.
    ///
    /// Returns the stored result for these arguments, or runs the function,
    /// stores its result and returns it. A panic in the function propagates
    /// and stores nothing.
    ///
    /// Whatever the function returns is stored, an `Err` included. Fallible
    /// functions should go through [`Memoized::try_call`].
    pub fn call(&self, args: Args) -> F::Output
    where
        C: Cache<F::Key, F::Output>,
    {
        let key = F::compose(args);
        self.cache
            .get_or_add(key, |key| self.func.call_with_key(key))
    }

    /// Calls a fallible function through the cache, storing only `Ok`
    /// values.
    ///
    /// The cache holds the success type `T`, not the `Result`, so an `Err`
    /// is returned to the caller and the next call with the same arguments
    /// runs the function again. [`try_memoize`] builds a suitable cache.
    pub fn try_call<T, E>(&self, args: Args) -> Result<T, E>
    where
        F: MemoFn<Args, Output = Result<T, E>>,
        C: Cache<F::Key, T>,
    {
        let key = F::compose(args);
        self.cache
            .try_get_or_add(key, |key| self.func.call_with_key(key))
    }

    /// Empties the backing cache.
    pub fn clear<V>(&self)
    where
        C: Cache<F::Key, V>,
    {
        self.cache.clear();
    }

    /// Turns the memoized function into a plain closure over argument
    /// tuples.
    pub fn into_fn(self) -> impl Fn(Args) -> F::Output
    where
        C: Cache<F::Key, F::Output>,
    {
        move |args| self.call(args)
    }
}

impl<F, C, Args> fmt::Debug for Memoized<F, C, Args>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
