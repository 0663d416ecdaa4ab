//! Basic thread pool usage example
//!
//! Demonstrates pool creation, job submission, LIFO ordering, statistics and
//! parallel iteration.
//!
//! Run with: cargo run --example basic_usage

use rust_parallel_pool::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Rust Parallel Pool - Basic Usage Example ===\n");

    // Workers are running as soon as the pool exists
    let pool = ThreadPool::with_threads(4)?;
    println!("1. Thread pool running with {} threads", pool.num_threads());

    println!("\n2. Submitting simple jobs:");
    for i in 0..10 {
        pool.execute(move || {
            println!(
                "  Job {} executing on thread {:?}",
                i,
                thread::current().name()
            );
            thread::sleep(Duration::from_millis(20));
            Ok(())
        })?;
    }
    println!("   Submitted 10 jobs, {} still pending", pool.pending_count());

    pool.wait_for_finish();

    println!("\n3. Job statistics:");
    println!("   Total jobs submitted: {}", pool.total_jobs_submitted());
    println!("   Total jobs processed: {}", pool.total_jobs_processed());
    println!("   Total jobs failed: {}", pool.total_jobs_failed());

    println!("\n4. Per-worker statistics:");
    for (i, stat) in pool.get_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} processed, {} failed, avg time: {:.2}μs",
            i,
            stat.get_jobs_processed(),
            stat.get_jobs_failed(),
            stat.get_average_processing_time_us()
        );
    }

    println!("\n5. Parallel iteration on the same pool:");
    let data: Vec<u64> = (1..=1_000).collect();
    let sum = AtomicU64::new(0);
    pool.parallel_for(
        |value: &u64| {
            sum.fetch_add(value * value, Ordering::Relaxed);
        },
        &data,
    )?;
    println!("   Sum of squares 1..=1000: {}", sum.load(Ordering::Relaxed));

    println!("\n6. Per-call pool, last element dispatched first:");
    let names = ["cheap", "cheap", "cheap", "expensive"];
    parallel_for(
        |name: &&str, index: usize| println!("   [{}] {}", index, name),
        1,
        &names,
    )?;

    println!("\n7. Shutting down (drains anything still queued)");
    pool.shutdown()?;
    println!("   Shutting down: {}", pool.is_shutting_down());

    match pool.execute(|| Ok(())) {
        Err(e) => println!("   Late submission rejected: {}", e),
        Ok(()) => println!("   Late submission unexpectedly accepted"),
    }

    println!("\n=== Example completed successfully ===");
    Ok(())
}
