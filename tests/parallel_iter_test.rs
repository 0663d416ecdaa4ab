//! Integration tests for parallel_for and iterate_weighted

use rust_parallel_pool::iter::{partition_by_weight, IterSection};
use rust_parallel_pool::prelude::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_parallel_for_every_worker_count() {
    for len in [0usize, 1, 2, 7, 33] {
        let data: Vec<usize> = (0..len).collect();
        for workers in 1..=len.max(1) {
            let hits: Vec<AtomicUsize> = (0..len).map(|_| AtomicUsize::new(0)).collect();
            parallel_for(
                |_: &usize, index: usize| {
                    hits[index].fetch_add(1, Ordering::SeqCst);
                },
                workers,
                &data,
            )
            .expect("Iteration failed");
            assert!(
                hits.iter().all(|h| h.load(Ordering::SeqCst) == 1),
                "len {} workers {}",
                len,
                workers
            );
        }
    }
}

#[test]
fn test_parallel_for_reverse_dispatch_order() {
    let data: Vec<u32> = (0..16).collect();
    let order = Mutex::new(Vec::new());

    parallel_for(|value: &u32| order.lock().push(*value), 1, &data).expect("Iteration failed");

    let expected: Vec<u32> = (0..16).rev().collect();
    assert_eq!(*order.lock(), expected);
}

#[test]
fn test_pointer_collections() {
    let owned: Vec<String> = ["alpha", "beta", "gamma"].iter().map(|s| s.to_string()).collect();
    let refs: Vec<&String> = owned.iter().collect();
    let boxed: Vec<Box<String>> = owned.iter().cloned().map(Box::new).collect();
    let letters = AtomicUsize::new(0);

    parallel_for(
        |s: &&String| {
            letters.fetch_add(s.len(), Ordering::SeqCst);
        },
        2,
        &refs,
    )
    .expect("Iteration failed");
    parallel_for(
        |s: &Box<String>, index: usize| {
            assert_eq!(**s, owned[index]);
            letters.fetch_add(s.len(), Ordering::SeqCst);
        },
        2,
        &boxed,
    )
    .expect("Iteration failed");

    assert_eq!(letters.load(Ordering::SeqCst), 2 * 14);
}

#[test]
fn test_extra_arguments_are_captured() {
    let data = vec![1, 2, 3, 4];
    let scale = 10;
    let offset = 5;
    let results = Mutex::new(vec![0; 4]);

    parallel_for(
        |value: &i32, index: usize| results.lock()[index] = value * scale + offset,
        3,
        &data,
    )
    .expect("Iteration failed");

    assert_eq!(*results.lock(), vec![15, 25, 35, 45]);
}

#[test]
fn test_weighted_worked_example() {
    let sections = partition_by_weight(&[1.0; 10], 3);
    assert_eq!(
        sections,
        vec![
            IterSection::new(0, 4),
            IterSection::new(4, 8),
            IterSection::new(8, 10)
        ]
    );
}

#[test]
fn test_weighted_sections_ascend_within_each_job() {
    let data: Vec<f64> = vec![5.0, 1.0, 1.0, 1.0, 1.0, 1.0, 8.0, 2.0, 0.5, 3.0];
    let log = Mutex::new(Vec::new());

    iterate_weighted(
        |_: &f64, index: usize| log.lock().push(index),
        |weight: &f64| *weight,
        3,
        &data,
    )
    .expect("Iteration failed");

    let log = log.into_inner();
    assert_eq!(log.len(), data.len());
    let position = |index: usize| log.iter().position(|&i| i == index);

    for section in partition_by_weight(&data, 3) {
        let positions: Vec<_> = section.range().map(position).collect();
        assert!(positions.iter().all(Option::is_some));
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "section {:?} ran out of order: {:?}",
            section,
            log
        );
    }
}

#[test]
fn test_weighted_zero_and_negative_weights() {
    let data = vec![-1.0, 0.0, 0.0, -3.0];
    let seen = AtomicUsize::new(0);

    iterate_weighted(
        |_: &f64| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
        |weight: &f64| *weight,
        2,
        &data,
    )
    .expect("Iteration failed");

    assert_eq!(seen.load(Ordering::SeqCst), 4);
}

#[test]
fn test_weighted_panic_reports_sections() {
    let data: Vec<u32> = (0..12).collect();

    let result = iterate_weighted(
        |value: &u32| {
            if *value == 0 {
                panic!("first element rejected");
            }
        },
        |_: &u32| 1.0,
        3,
        &data,
    );

    match result {
        Err(ThreadError::JobsPanicked { panicked, total }) => {
            assert_eq!(panicked, 1);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected result {:?}", other),
    }
}
