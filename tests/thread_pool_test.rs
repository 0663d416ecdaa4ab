//! Integration tests for the long-lived thread pool

use rust_parallel_pool::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_submitters_stress() {
    // T threads each submit M jobs to one pool
    const SUBMITTERS: usize = 8;
    const JOBS_PER_SUBMITTER: usize = 2_000;

    let pool = Arc::new(ThreadPool::with_threads(4).expect("Failed to create pool"));
    let counter = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(SUBMITTERS));

    let submitters: Vec<_> = (0..SUBMITTERS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let counter = Arc::clone(&counter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..JOBS_PER_SUBMITTER {
                    let counter = Arc::clone(&counter);
                    pool.execute(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .expect("Failed to submit job");
                }
            })
        })
        .collect();

    for submitter in submitters {
        submitter.join().expect("Submitter panicked");
    }
    pool.shutdown().expect("Failed to shutdown pool");

    let expected = SUBMITTERS * JOBS_PER_SUBMITTER;
    assert_eq!(counter.load(Ordering::SeqCst), expected);
    assert_eq!(pool.total_jobs_submitted(), expected as u64);
    assert_eq!(pool.total_jobs_processed(), expected as u64);
}

#[test]
fn test_teardown_drains_queue_set_before_jobs_run() {
    let pool = ThreadPool::with_threads(1).expect("Failed to create pool");
    let (started_tx, started_rx) = mpsc::channel();
    let release = Arc::new(AtomicBool::new(false));

    // Hold the only worker so every later job is still queued at shutdown
    let release_clone = Arc::clone(&release);
    pool.execute(move || {
        started_tx.send(()).expect("Test receiver gone");
        while !release_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    })
    .expect("Failed to submit blocking job");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Blocking job never started");

    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..25 {
        let counter = Arc::clone(&counter);
        pool.execute(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit job");
    }
    assert_eq!(pool.pending_count(), 25);

    let releaser = {
        let release = Arc::clone(&release);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            release.store(true, Ordering::SeqCst);
        })
    };

    pool.shutdown().expect("Failed to shutdown pool");
    assert!(pool.is_shutting_down());
    assert_eq!(counter.load(Ordering::SeqCst), 25);
    releaser.join().expect("Releaser panicked");
}

#[test]
fn test_submit_rejected_during_and_after_shutdown() {
    let pool = ThreadPool::with_threads(2).expect("Failed to create pool");
    pool.shutdown().expect("Failed to shutdown pool");

    let err = pool.execute(|| Ok(())).unwrap_err();
    assert!(matches!(err, ThreadError::ShuttingDown { pending_jobs: 0 }));
    assert!(err.to_string().contains("shutting down"));
}

#[test]
fn test_wait_for_finish_keeps_pool_alive() {
    let pool = ThreadPool::with_rest(2, 0.005).expect("Failed to create pool");
    let total = Arc::new(AtomicU64::new(0));

    for round in 0..5u64 {
        for i in 0..10u64 {
            let total = Arc::clone(&total);
            pool.execute(move || {
                total.fetch_add(round * 10 + i, Ordering::SeqCst);
                Ok(())
            })
            .expect("Failed to submit job");
        }
        pool.wait_for_finish();
        assert_eq!(pool.pending_count(), 0);
        assert_eq!(pool.active_count(), 0);
        assert!(!pool.is_shutting_down());
    }

    assert_eq!(total.load(Ordering::SeqCst), (0..50).sum::<u64>());
    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_drop_joins_workers() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let pool = ThreadPool::with_threads(3).expect("Failed to create pool");
        for _ in 0..30 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("Failed to submit job");
        }
    }
    assert_eq!(counter.load(Ordering::SeqCst), 30);
}

#[test]
fn test_pool_batches_borrow_local_data() {
    let pool = ThreadPool::with_threads(4).expect("Failed to create pool");

    for round in 1..=3usize {
        let data: Vec<usize> = (0..round * 100).collect();
        let hits: Vec<AtomicUsize> = data.iter().map(|_| AtomicUsize::new(0)).collect();

        pool.parallel_for(
            |value: &usize, index: usize, origin: &[usize]| {
                assert_eq!(origin[index], *value);
                hits[index].fetch_add(1, Ordering::SeqCst);
            },
            &data,
        )
        .expect("Batch failed");
        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));

        pool.iterate_weighted(
            |_: &usize, index: usize| {
                hits[index].fetch_add(1, Ordering::SeqCst);
            },
            |value: &usize| (*value % 7) as f64 + 0.5,
            &data,
        )
        .expect("Weighted batch failed");
        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 2));
    }

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_pool_batch_rejects_bad_weight_before_running() {
    let pool = ThreadPool::with_threads(2).expect("Failed to create pool");
    let data = [1.0, 2.0, f64::INFINITY];
    let calls = AtomicUsize::new(0);

    let result = pool.iterate_weighted(
        |_: &f64| {
            calls.fetch_add(1, Ordering::SeqCst);
        },
        |weight: &f64| *weight,
        &data,
    );

    assert!(matches!(
        result,
        Err(ThreadError::InvalidWeight { index: 2, .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(pool.total_jobs_submitted(), 0);
}

#[test]
fn test_config_thread_name_prefix() {
    let config = ThreadPoolConfig::new(2).with_thread_name_prefix("render");
    let pool = ThreadPool::with_config(config).expect("Failed to create pool");
    let (tx, rx) = mpsc::channel();

    pool.execute(move || {
        let name = thread::current().name().map(str::to_string);
        tx.send(name).expect("Test receiver gone");
        Ok(())
    })
    .expect("Failed to submit job");

    let name = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Job never ran")
        .expect("Worker thread is unnamed");
    assert!(name.starts_with("render-"), "unexpected name {}", name);
    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_invalid_config_rejected() {
    let config = ThreadPoolConfig::new(1).with_thread_name_prefix("bad\0name");
    assert!(matches!(
        ThreadPool::with_config(config),
        Err(ThreadError::InvalidConfig { .. })
    ));
}

#[test]
fn test_last_pool_handle_dropped_on_worker() {
    // Releases its pool handle, then reports; a failed teardown never reports
    struct ReleaseOnDrop {
        pool: Option<Arc<ThreadPool>>,
        released: mpsc::Sender<()>,
    }

    impl Drop for ReleaseOnDrop {
        fn drop(&mut self) {
            drop(self.pool.take());
            let _ = self.released.send(());
        }
    }

    let pool = Arc::new(ThreadPool::with_threads(2).expect("Failed to create pool"));
    let counter = Arc::new(AtomicUsize::new(0));
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let (released_tx, released_rx) = mpsc::channel();

    let holder = ReleaseOnDrop {
        pool: Some(Arc::clone(&pool)),
        released: released_tx,
    };
    pool.execute(move || {
        let _holder = holder;
        go_rx
            .recv_timeout(Duration::from_secs(5))
            .map_err(|e| ThreadError::other(e.to_string()))
    })
    .expect("Failed to submit job");

    let c = Arc::clone(&counter);
    pool.execute(move || {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit job");

    // The job now holds the only handle, so the pool is torn down on its worker
    drop(pool);
    go_tx.send(()).expect("Job should be waiting");

    released_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Pool teardown on its own worker did not complete");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_from_own_job() {
    let pool = Arc::new(ThreadPool::with_threads(2).expect("Failed to create pool"));
    let (tx, rx) = mpsc::channel();

    let inner = Arc::clone(&pool);
    pool.execute(move || {
        let _ = tx.send(inner.shutdown());
        Ok(())
    })
    .expect("Failed to submit job");

    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shutdown from a job did not return");
    assert!(result.is_ok());
    assert!(pool.is_shutting_down());
    assert!(pool.execute(|| Ok(())).is_err());
    pool.shutdown().expect("Second shutdown should succeed");
}
