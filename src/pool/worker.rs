//! Worker thread implementation

use crate::core::{QueuedJob, Result, ThreadError};
use crate::queue::JobQueue;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use ::tracing::{debug, span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs processed
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that failed
    pub jobs_failed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

/// Point-in-time copy of a worker's statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatSnapshot {
    /// Jobs that completed successfully
    pub jobs_processed: u64,
    /// Jobs that returned an error
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Time spent executing jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl WorkerStatSnapshot {
    /// Jobs that ran, whatever their outcome
    pub fn jobs_executed(&self) -> u64 {
        self.jobs_processed + self.jobs_failed + self.jobs_panicked
    }
}

impl std::ops::Add for WorkerStatSnapshot {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            jobs_processed: self.jobs_processed + other.jobs_processed,
            jobs_failed: self.jobs_failed + other.jobs_failed,
            jobs_panicked: self.jobs_panicked + other.jobs_panicked,
            total_processing_time_us: self.total_processing_time_us
                + other.total_processing_time_us,
        }
    }
}

impl std::iter::Sum for WorkerStatSnapshot {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, s| acc + s)
    }
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.jobs_processed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> WorkerStatSnapshot {
        WorkerStatSnapshot {
            jobs_processed: self.get_jobs_processed(),
            jobs_failed: self.get_jobs_failed(),
            jobs_panicked: self.get_jobs_panicked(),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// A worker thread that processes jobs from a queue
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread_id: thread::ThreadId,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Create and start a new worker
    ///
    /// # Arguments
    ///
    /// * `id` - Index of this worker within its pool
    /// * `name` - OS thread name
    /// * `queue` - Queue shared with the pool
    /// * `idle_rest` - Longest park while the queue is empty (zero = until woken)
    ///
    /// # Shutdown Behavior
    ///
    /// Workers exit when the queue is closed and empty,
    /// ensuring all queued jobs are processed before shutdown completes.
    pub fn new(
        id: usize,
        name: String,
        queue: Arc<JobQueue<'static>>,
        idle_rest: Duration,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                run(id, &queue, &stats_clone, idle_rest);
            })
            .map_err(|e| ThreadError::spawn_with_source(id, "Cannot create worker thread", e))?;

        Ok(Self {
            id,
            thread_id: thread.thread().id(),
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// OS thread this worker runs on
    pub fn thread_id(&self) -> thread::ThreadId {
        self.thread_id
    }

    /// Whether the caller is running on this worker's own thread
    pub fn is_current(&self) -> bool {
        self.thread_id == thread::current().id()
    }

    /// Release the thread handle without waiting for the thread
    ///
    /// The worker thread keeps running its loop and exits on its own once the
    /// queue is closed and empty.
    pub fn detach(mut self) {
        self.thread.take();
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| ThreadError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Only reached for workers that were never joined, e.g. when a later
        // spawn failed. The owning pool closes the queue first.
        if self.is_current() {
            return;
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("worker {} panicked outside of a job", self.id);
            }
        }
    }
}

/// Main worker loop
///
/// Pops jobs until the queue reports closed-and-empty. This ensures all queued
/// jobs are processed before shutdown, and is shared by long-lived and per-call
/// pools.
pub(crate) fn run(id: usize, queue: &JobQueue<'_>, stats: &WorkerStats, idle_rest: Duration) {
    #[cfg(feature = "tracing")]
    let worker_span = span!(Level::DEBUG, "worker", id = id);
    #[cfg(feature = "tracing")]
    let _guard = worker_span.enter();

    log::debug!("worker {} started", id);

    while let Some(mut job) = queue.pop(idle_rest) {
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_busy(id);

        execute_job(id, &mut job, stats);
        // Release the handle before reporting completion: a pool-owned job is
        // freed here, a caller-owned one is released back to its batch.
        drop(job);
        queue.finish();

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_idle(id);
    }

    #[cfg(feature = "tracing")]
    debug!(
        jobs_processed = stats.get_jobs_processed(),
        jobs_failed = stats.get_jobs_failed(),
        "worker shutting down"
    );
    log::debug!(
        "worker {} exiting after {} jobs",
        id,
        stats.snapshot().jobs_executed()
    );
}

/// Execute a single job with panic protection
///
/// A panicking job is counted and logged; the worker carries on with the
/// next job so the queue is still drained.
pub(crate) fn execute_job(id: usize, job: &mut QueuedJob<'_>, stats: &WorkerStats) {
    #[cfg(feature = "tracing")]
    let job_span = span!(Level::DEBUG, "job_execution", job_type = job.job_type());
    #[cfg(feature = "tracing")]
    let _job_guard = job_span.enter();

    let start = Instant::now();

    let panic_result = catch_unwind(AssertUnwindSafe(|| job.execute()));

    let elapsed = start.elapsed();
    let elapsed_us = elapsed.as_micros() as u64;

    match panic_result {
        Ok(Ok(())) => {
            stats.increment_processed();
            #[cfg(feature = "tracing")]
            {
                debug!(duration_ms = elapsed.as_millis() as u64, "job completed");
                crate::tracing::metrics::record_completion(elapsed, true);
            }
        }
        Ok(Err(e)) => {
            #[cfg(feature = "tracing")]
            {
                ::tracing::warn!(
                    error = %e,
                    duration_ms = elapsed.as_millis() as u64,
                    "job failed"
                );
                crate::tracing::metrics::record_completion(elapsed, false);
            }
            log::warn!("worker {}: job {} failed: {}", id, job.job_type(), e);
            stats.increment_failed();
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            #[cfg(feature = "tracing")]
            {
                ::tracing::error!(
                    panic_message = %panic_msg,
                    duration_ms = elapsed.as_millis() as u64,
                    "job panicked"
                );
                crate::tracing::metrics::record_panic(elapsed);
            }
            log::error!("worker {}: job {} panicked: {}", id, job.job_type(), panic_msg);
            stats.increment_panicked();
        }
    }

    stats.add_processing_time(elapsed_us);
}
