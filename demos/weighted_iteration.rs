//! Weighted iteration example
//!
//! Compares uniform and weight-balanced iteration over a collection whose
//! elements have very different costs.
//!
//! Run with: cargo run --example weighted_iteration

use rand::Rng;
use rust_parallel_pool::iter::partition_by_weight;
use rust_parallel_pool::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

struct Task {
    name: String,
    cost_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Rust Parallel Pool - Weighted Iteration Example ===\n");

    let mut rng = rand::thread_rng();
    let tasks: Vec<Task> = (0..24)
        .map(|i| Task {
            name: format!("task-{:02}", i),
            cost_ms: if i % 8 == 0 { 40 } else { rng.gen_range(1..6) },
        })
        .collect();
    let workers = 4;

    let weights: Vec<f64> = tasks.iter().map(|t| t.cost_ms as f64).collect();
    println!("1. Sections for {} workers:", workers);
    for section in partition_by_weight(&weights, workers) {
        let weight: f64 = weights[section.range()].iter().sum();
        println!(
            "   [{:>2}, {:>2})  {} tasks, {:>5.1} ms",
            section.start,
            section.end,
            section.len(),
            weight
        );
    }

    let busy = AtomicU64::new(0);
    let run = |task: &Task| {
        thread::sleep(Duration::from_millis(task.cost_ms));
        busy.fetch_add(task.cost_ms, Ordering::Relaxed);
    };

    println!("\n2. One job per element:");
    let start = Instant::now();
    parallel_for(run, workers, &tasks)?;
    println!("   {:?}", start.elapsed());

    println!("\n3. One job per balanced section:");
    let start = Instant::now();
    iterate_weighted(run, |task: &Task| task.cost_ms as f64, workers, &tasks)?;
    println!("   {:?}", start.elapsed());

    println!("\n4. Indexed callback, mutable access:");
    let mut scores: Vec<u64> = tasks.iter().map(|t| t.cost_ms).collect();
    iterate_weighted_mut(
        |score: &mut u64, index: usize| *score = *score * 10 + index as u64,
        |score: &u64| *score as f64,
        workers,
        &mut scores,
    )?;
    println!("   {} -> {}", tasks[0].name, scores[0]);
    println!("   {} -> {}", tasks[23].name, scores[23]);

    println!(
        "\nTotal simulated work: {} ms",
        busy.load(Ordering::Relaxed)
    );
    Ok(())
}
