use std::hash::Hash;

/// A function that can be memoized over the argument tuple `Args`.
///
/// The trait turns the arguments of one call into a single cache key and
/// calls the function back from a key. It is implemented for every
/// `Fn(A1, .., An) -> R` with `n` from 0 to 8 whose arguments are
/// `Eq + Hash + Clone`:
///
/// | arity | `Args`         | `Key`          |
/// |-------|----------------|----------------|
/// | 0     | `()`           | `()`           |
/// | 1     | `(A,)`         | `A`            |
/// | n ≥ 2 | `(A1, .., An)` | `(A1, .., An)` |
///
/// A single argument is its own key, so one-argument functions pay nothing
/// for tupling. For two or more arguments the key is the ordered tuple, so
/// `(1, 2)` and `(2, 1)` are different keys.
///
/// # Examples
///
/// ```
/// use memora_core::MemoFn;
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// let key = <fn(i32, i32) -> i32 as MemoFn<(i32, i32)>>::compose((1, 2));
/// assert_eq!(key, (1, 2));
///
/// let f: fn(i32, i32) -> i32 = add;
/// assert_eq!(f.call_with_key(&key), 3);
/// ```
pub trait MemoFn<Args> {
    /// Composite key built from `Args`.
    type Key: Eq + Hash;
    /// Return type of the function.
    type Output;

    /// Builds the cache key for one call.
    fn compose(args: Args) -> Self::Key;

    /// Unpacks `key` into arguments and calls the function.
    fn call_with_key(&self, key: &Self::Key) -> Self::Output;
}

impl<Func, Ret> MemoFn<()> for Func
where
    Func: Fn() -> Ret,
{
    type Key = ();
    type Output = Ret;

    #[inline]
    fn compose(_args: ()) -> Self::Key {}

    #[inline]
    fn call_with_key(&self, _key: &()) -> Ret {
        self()
    }
}

impl<Func, Ret, A> MemoFn<(A,)> for Func
where
    Func: Fn(A) -> Ret,
    A: Eq + Hash + Clone,
{
    type Key = A;
    type Output = Ret;

    #[inline]
    fn compose((a,): (A,)) -> A {
        a
    }

    #[inline]
    fn call_with_key(&self, key: &A) -> Ret {
        self(key.clone())
    }
}

macro_rules! tuple_memo_fn {
    ($($ty:ident $arg:ident),+) => {
        impl<Func, Ret, $($ty),+> MemoFn<($($ty,)+)> for Func
        where
            Func: Fn($($ty),+) -> Ret,
            $($ty: Eq + Hash + Clone,)+
        {
            type Key = ($($ty,)+);
            type Output = Ret;

            #[inline]
            fn compose(args: ($($ty,)+)) -> Self::Key {
                args
            }

            #[inline]
            fn call_with_key(&self, key: &Self::Key) -> Ret {
                let ($($arg,)+) = key;
                self($($arg.clone()),+)
            }
        }
    };
}

tuple_memo_fn!(A a, B b);
tuple_memo_fn!(A a, B b, C c);
tuple_memo_fn!(A a, B b, C c, D d);
tuple_memo_fn!(A a, B b, C c, D d, E e);
tuple_memo_fn!(A a, B b, C c, D d, E e, F f);
tuple_memo_fn!(A a, B b, C c, D d, E e, F f, G g);
tuple_memo_fn!(A a, B b, C c, D d, E e, F f, G g, H h);
