use memora::{memoize, memoize_with, Cache, LimitlessCache, SingleFlightCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;

#[test]
fn test_single_flight_attribute_computes_once_under_race() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize(single_flight = true)]
    fn slow_square(x: u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        x * x
    }

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                slow_square(12)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 144);
    }
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_limitless_race_stores_one_value() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(LimitlessCache::new());
    let counter = Arc::clone(&calls);
    let slow_id = Arc::new(memoize_with(
        move |x: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            x
        },
        Arc::clone(&cache),
    ));

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let f = Arc::clone(&slow_id);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                f.call((9,))
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 9);
    }

    // Racers may each compute, but only one entry exists afterwards and a
    // sequential call is a hit.
    let racing_calls = calls.load(Ordering::SeqCst);
    assert!((1..=THREADS).contains(&racing_calls));
    assert_eq!(cache.len(), 1);
    assert_eq!(slow_id.call((9,)), 9);
    assert_eq!(calls.load(Ordering::SeqCst), racing_calls);
}

#[test]
fn test_distinct_keys_from_many_threads() {
    let square = Arc::new(memoize(|x: u64| x * x));

    let handles: Vec<_> = (0..THREADS as u64)
        .map(|t| {
            let square = Arc::clone(&square);
            thread::spawn(move || {
                for i in 0..250 {
                    let x = t * 250 + i;
                    assert_eq!(square.call((x,)), x * x);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(square.cache().len(), THREADS * 250);
}

#[test]
fn test_clear_while_calling() {
    let cache = Arc::new(SingleFlightCache::new());
    let double = Arc::new(memoize_with(|x: u32| x * 2, Arc::clone(&cache)));

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let double = Arc::clone(&double);
            thread::spawn(move || {
                for round in 0..500u32 {
                    let x = round % 50;
                    assert_eq!(double.call((x,)), x * 2);
                }
            })
        })
        .collect();

    let clearer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for _ in 0..50 {
                cache.clear();
                thread::yield_now();
            }
        })
    };

    for handle in callers {
        handle.join().unwrap();
    }
    clearer.join().unwrap();

    assert!(cache.len() <= 50);
    for x in 0..50 {
        if let Some(value) = cache.get(&x) {
            assert_eq!(value, x * 2);
        }
    }
}
