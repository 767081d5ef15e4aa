use memora::memoize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn test_basic_attribute() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn inc(x: i32) -> i32 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x + 1
    }

    assert_eq!(inc(1), 2);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(inc(1), 2);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(inc(2), 3);
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_recursive_function() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn fibonacci(n: u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            return n;
        }
        fibonacci(n - 1) + fibonacci(n - 2)
    }

    assert_eq!(fibonacci(50), 12_586_269_025);
    // One run per distinct n in 0..=50.
    assert_eq!(CALLS.load(Ordering::SeqCst), 51);
}

#[test]
fn test_multiple_arguments_keep_order() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn join(a: String, b: String, sep: char) -> String {
        CALLS.fetch_add(1, Ordering::SeqCst);
        format!("{a}{sep}{b}")
    }

    assert_eq!(join("x".into(), "y".into(), '-'), "x-y");
    assert_eq!(join("y".into(), "x".into(), '-'), "y-x");
    assert_eq!(join("x".into(), "y".into(), '-'), "x-y");
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_zero_arguments() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn banner() -> String {
        CALLS.fetch_add(1, Ordering::SeqCst);
        "=".repeat(10)
    }

    assert_eq!(banner(), "==========");
    assert_eq!(banner(), "==========");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_mut_argument() {
    #[memoize]
    fn digit_sum(mut n: u64) -> u64 {
        let mut sum = 0;
        while n > 0 {
            sum += n % 10;
            n /= 10;
        }
        sum
    }

    assert_eq!(digit_sum(9875), 29);
    assert_eq!(digit_sum(9875), 29);
}

#[test]
fn test_global_scope_is_shared_between_threads() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn cube(x: u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x * x * x
    }

    assert_eq!(cube(3), 27);
    thread::spawn(|| assert_eq!(cube(3), 27)).join().unwrap();
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_thread_scope_is_per_thread() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize(scope = "thread")]
    fn square(x: u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x * x
    }

    assert_eq!(square(4), 16);
    assert_eq!(square(4), 16);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    thread::spawn(|| {
        assert_eq!(square(4), 16);
        assert_eq!(square(4), 16);
    })
    .join()
    .unwrap();
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_thread_scope_recursion() {
    #[memoize(scope = "thread")]
    fn paths(rows: u32, cols: u32) -> u64 {
        if rows == 0 || cols == 0 {
            return 1;
        }
        paths(rows - 1, cols) + paths(rows, cols - 1)
    }

    assert_eq!(paths(16, 16), 601_080_390);
}

#[test]
fn test_attributes_on_function_are_kept() {
    /// Documented and inlined; both attributes pass through.
    #[memoize]
    #[inline]
    #[allow(clippy::needless_return)]
    fn halve(x: u32) -> u32 {
        return x / 2;
    }

    assert_eq!(halve(9), 4);
}

mod visibility {
    use memora::memoize;

    #[memoize]
    pub fn shared_len(s: String) -> usize {
        s.chars().count()
    }
}

#[test]
fn test_visibility_is_kept() {
    assert_eq!(visibility::shared_len("héllo".to_string()), 5);
}
