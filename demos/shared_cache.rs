//! Two memoized functions backed by caches the caller owns, one of them
//! cleared by hand.

use memora::{memoize_with, Cache, LimitlessCache};
use std::sync::Arc;

fn main() {
    println!("=== Caller-Owned Caches ===\n");

    let distances = Arc::new(LimitlessCache::new());
    let manhattan = memoize_with(
        |x1: i64, y1: i64, x2: i64, y2: i64| {
            println!("  computing distance ({x1}, {y1}) -> ({x2}, {y2})");
            (x1 - x2).abs() + (y1 - y2).abs()
        },
        Arc::clone(&distances),
    );

    println!("manhattan = {}", manhattan.call((0, 0, 3, 4)));
    println!("manhattan = {}", manhattan.call((0, 0, 3, 4)));
    println!("manhattan = {}", manhattan.call((3, 4, 0, 0)));
    println!("Stored distances: {}\n", distances.len());

    distances.clear();
    println!("Cleared; stored distances: {}", distances.len());
    println!("manhattan = {}\n", manhattan.call((0, 0, 3, 4)));

    let words = LimitlessCache::new();
    let shout = memoize_with(
        |word: String| {
            println!("  uppercasing {word:?}");
            word.to_uppercase()
        },
        &words,
    );

    for word in ["memo", "cache", "memo"] {
        println!("shout = {}", shout.call((word.to_string(),)));
    }
    println!("Cached words: {}", words.len());
    println!("Lookup \"cache\": {:?}", words.get(&"cache".to_string()));
}
