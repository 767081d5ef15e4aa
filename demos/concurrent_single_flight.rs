//! Eight threads ask for the same slow value at the same moment. With
//! `single_flight = true` the body runs once and every thread gets its
//! result; the default cache may run it once per racing thread.

use memora::memoize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

static SLOW_CALLS: AtomicUsize = AtomicUsize::new(0);
static RACY_CALLS: AtomicUsize = AtomicUsize::new(0);

#[memoize(single_flight = true)]
fn load_report(id: u32) -> String {
    SLOW_CALLS.fetch_add(1, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(200));
    format!("report #{id}")
}

#[memoize]
fn load_report_racy(id: u32) -> String {
    RACY_CALLS.fetch_add(1, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(200));
    format!("report #{id}")
}

fn race(threads: usize, f: fn(u32) -> String) {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let report = f(42);
                println!("  Thread {thread_id}: {report}");
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Single-Flight Computation ===\n");

    race(8, load_report);
    println!(
        "\nsingle_flight = true: body ran {} time(s)\n",
        SLOW_CALLS.load(Ordering::SeqCst)
    );

    race(8, load_report_racy);
    println!(
        "\ndefault cache: body ran {} time(s)",
        RACY_CALLS.load(Ordering::SeqCst)
    );
}
