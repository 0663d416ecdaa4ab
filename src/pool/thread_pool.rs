//! Thread pool implementation

use crate::core::{ClosureJob, Job, QueuedJob, Result};
use crate::iter::dispatch::ElementFn;
use crate::iter::weighted::{compute_weights, partition_by_weight};
use crate::pool::config::ThreadPoolConfig;
use crate::pool::worker::{Worker, WorkerStatSnapshot, WorkerStats};
use crate::queue::JobQueue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A fixed-size pool of worker threads sharing one LIFO job queue
///
/// All workers are spawned when the pool is constructed and live until
/// [`shutdown`](Self::shutdown) (or drop).
///
/// # Job Order
///
/// Workers always take the most recently submitted job. Under load, the job
/// submitted last starts first.
///
/// # Shutdown Mechanism
///
/// Shutdown closes the queue and joins every worker. A worker only exits once
/// it finds the queue both closed and empty, so every job submitted before
/// shutdown runs before `shutdown` returns.
///
/// # Example
///
/// ```rust
/// use rust_parallel_pool::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let pool = ThreadPool::with_threads(4)?;
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..100 {
///     let counter = Arc::clone(&counter);
///     pool.execute(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     })?;
/// }
///
/// pool.shutdown()?;
/// assert_eq!(counter.load(Ordering::Relaxed), 100);
/// # Ok(())
/// # }
/// ```
pub struct ThreadPool {
    config: ThreadPoolConfig,
    num_threads: usize,
    queue: Arc<JobQueue<'static>>,
    workers: Mutex<Vec<Worker>>,
    stats: Vec<Arc<WorkerStats>>,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("num_threads", &self.num_threads)
            .field("queue", &self.queue)
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl ThreadPool {
    /// Create a new thread pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ThreadPoolConfig::default())
    }

    /// Create a thread pool with specified number of threads (0 = default)
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_threads))
    }

    /// Create a thread pool from a thread count and an idle rest in seconds
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::InvalidConfig` for a negative or non-finite rest.
    pub fn with_rest(num_threads: usize, idle_rest_secs: f64) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_threads).with_idle_rest_secs(idle_rest_secs)?)
    }

    /// Create a thread pool with custom configuration and spawn its workers
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::SpawnError` if any worker thread cannot be
    /// created. Workers spawned before the failure are shut down first; the
    /// pool never runs with fewer workers than resolved.
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        let num_threads = config.resolved_threads();
        let queue = Arc::new(JobQueue::new());

        let mut workers = Vec::with_capacity(num_threads);
        for id in 0..num_threads {
            let name = format!("{}-{}", config.thread_name_prefix, id);
            match Worker::new(id, name, Arc::clone(&queue), config.idle_rest) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    queue.close();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e);
                }
            }
        }
        let stats = workers.iter().map(Worker::stats).collect();

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(num_threads, "lifo");
        log::debug!(
            "thread pool '{}' started with {} workers",
            config.thread_name_prefix,
            num_threads
        );

        Ok(Self {
            config,
            num_threads,
            queue,
            workers: Mutex::new(workers),
            stats,
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Submit a job to the pool
    ///
    /// Never blocks: the queue is unbounded, so callers producing unbounded
    /// work must throttle themselves.
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::ShuttingDown` once shutdown has been requested.
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.queue.push(QueuedJob::Owned(Box::new(job)))?;
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(self.queue.len());
        Ok(())
    }

    /// Submit a job that runs inside the tracing span current at submission
    pub fn submit_traced<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit(crate::tracing::TracedJob::new(job))
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Queues a prepared batch under one lock.
    pub(crate) fn push_jobs(&self, jobs: Vec<QueuedJob<'static>>) -> Result<usize> {
        let queued = self.queue.push_batch(jobs)?;
        self.total_jobs_submitted
            .fetch_add(queued as u64, Ordering::Relaxed);
        Ok(queued)
    }

    /// Run `callback` once for every element of `data` on this pool
    ///
    /// Same contract as [`parallel_for`](crate::iter::parallel_for) (one job
    /// per element, queued in index order so the last element starts first)
    /// but reuses this pool's workers instead of spawning new ones. Returns
    /// once every element has been processed; the pool stays up.
    ///
    /// Must not be called from a job running on this same pool unless another
    /// worker is free to process the batch.
    ///
    /// # Errors
    ///
    /// - `ThreadError::ShuttingDown` if the pool no longer accepts work
    /// - `ThreadError::JobsPanicked` if any callback panicked
    pub fn parallel_for<T, F, M>(&self, callback: F, data: &[T]) -> Result<()>
    where
        T: Sync,
        F: ElementFn<T, M>,
    {
        let ranges = (0..data.len()).map(|index| index..index + 1).collect();
        self.run_ranges(&callback, data, ranges)
    }

    /// Run `callback` over `data` split into weight-balanced sections
    ///
    /// Same contract as [`iterate_weighted`](crate::iter::iterate_weighted),
    /// partitioned for this pool's worker count.
    ///
    /// # Errors
    ///
    /// - `ThreadError::InvalidWeight` if `weight` returns a non-finite value
    /// - `ThreadError::ShuttingDown` if the pool no longer accepts work
    /// - `ThreadError::JobsPanicked` if any callback panicked
    pub fn iterate_weighted<T, F, M, W>(&self, callback: F, weight: W, data: &[T]) -> Result<()>
    where
        T: Sync,
        F: ElementFn<T, M>,
        W: Fn(&T) -> f64,
    {
        if data.is_empty() {
            return Ok(());
        }
        let weights = compute_weights(data, weight)?;
        let ranges = partition_by_weight(&weights, self.num_threads)
            .iter()
            .map(|section| section.range())
            .collect();
        self.run_ranges(&callback, data, ranges)
    }

    /// Get the number of worker threads
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Get the configuration the pool was built from
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Number of jobs waiting to be picked up
    ///
    /// A snapshot: it may change as soon as it is read.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of jobs currently executing
    pub fn active_count(&self) -> usize {
        self.queue.in_flight()
    }

    /// Whether shutdown has been requested
    pub fn is_shutting_down(&self) -> bool {
        self.queue.is_closed()
    }

    /// Get total number of jobs submitted
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Block until no job is pending or running
    ///
    /// Intended for pools reused across several submission bursts. This is
    /// not a barrier: if other threads keep submitting while it waits, the
    /// call may return before their jobs run. Use [`shutdown`](Self::shutdown)
    /// when every job must be accounted for.
    pub fn wait_for_finish(&self) {
        self.queue.wait_until_idle();
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.stats.clone()
    }

    /// Summed statistics across all workers
    pub fn stats_snapshot(&self) -> WorkerStatSnapshot {
        self.stats.iter().map(|s| s.snapshot()).sum()
    }

    /// Get total jobs processed across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_processed()).sum()
    }

    /// Get total jobs failed across all workers
    pub fn total_jobs_failed(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_failed()).sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_panicked()).sum()
    }

    /// Shutdown the thread pool and wait for all workers to finish
    ///
    /// # Graceful Shutdown
    ///
    /// 1. Sets the shutdown flag; later submissions are refused
    /// 2. Waits for all workers to drain queued jobs and exit
    ///
    /// Jobs still queued when this is called are executed, not discarded.
    ///
    /// # Thread Safety
    ///
    /// Safe to call more than once and from several threads; every call
    /// returns only after the workers have been joined. Called from a job of
    /// this pool (or by dropping the last `Arc` to the pool inside one), the
    /// calling worker is detached instead of joined and exits on its own after
    /// the queue drains.
    pub fn shutdown(&self) -> Result<()> {
        let mut workers = self.workers.lock();
        if self.queue.close() {
            log::debug!(
                "thread pool '{}' shutting down with {} jobs pending",
                self.config.thread_name_prefix,
                self.queue.len()
            );
        }

        for worker in workers.drain(..) {
            if worker.is_current() {
                // Reached from one of this pool's own jobs. That worker
                // finishes its loop once the queue is drained.
                log::warn!(
                    "thread pool '{}' shut down from its own worker {}, not joining it",
                    self.config.thread_name_prefix,
                    worker.id()
                );
                worker.detach();
                continue;
            }
            worker.join()?;
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            self.total_jobs_processed(),
            self.total_jobs_failed(),
        );
        Ok(())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!(
                "failed to shutdown thread pool '{}' during drop: {}",
                self.config.thread_name_prefix,
                e
            );
        }
    }
}
