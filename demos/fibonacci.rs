//! Recursive Fibonacci with the default global cache.
//!
//! Run with `RUST_LOG=memora_core=trace` to see every hit and miss.

use memora::memoize;
use std::time::Instant;

#[memoize]
fn fibonacci(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    fibonacci(n - 1) + fibonacci(n - 2)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Memoized Fibonacci ===\n");

    let start = Instant::now();
    let result = fibonacci(90);
    println!("fibonacci(90) = {} (first call: {:?})", result, start.elapsed());

    let start = Instant::now();
    let result = fibonacci(90);
    println!("fibonacci(90) = {} (cached call: {:?})", result, start.elapsed());

    #[cfg(feature = "stats")]
    {
        let stats = memora::stats_registry::get("fibonacci").unwrap();
        println!("\nCache statistics:");
        println!("  Hits:         {}", stats.hits);
        println!("  Misses:       {}", stats.misses);
        println!("  Computations: {}", stats.computations);
        println!("  Hit rate:     {:.2}%", stats.hit_rate() * 100.0);
    }
}
