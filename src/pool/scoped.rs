//! Per-call pool used by the free-standing iteration functions.
//!
//! The pool lives for exactly one batch: workers are spawned, the batch is
//! queued, the shutdown flag is set, and the call returns once every worker
//! has drained the queue and been joined. Workers are scoped threads, so the
//! queued jobs may borrow the caller's stack.

use crate::core::{QueuedJob, Result, ThreadError};
use crate::pool::config::ThreadPoolConfig;
use crate::pool::worker::{self, WorkerStatSnapshot, WorkerStats};
use crate::queue::JobQueue;
use std::thread;

/// Runs `jobs` on a fresh pool built from `config` and tears it down.
///
/// Returns the summed statistics of all workers. Returns a spawn error, without
/// running any job, if any worker thread cannot be created.
pub(crate) fn run_batch<'env, I>(config: &ThreadPoolConfig, jobs: I) -> Result<WorkerStatSnapshot>
where
    I: IntoIterator<Item = QueuedJob<'env>>,
{
    config.validate()?;
    let num_threads = config.resolved_threads();

    let queue: JobQueue<'env> = JobQueue::new();
    let stats: Vec<WorkerStats> = (0..num_threads).map(|_| WorkerStats::new()).collect();

    #[cfg(feature = "tracing")]
    crate::tracing::metrics::record_pool_start(num_threads, "scoped");
    log::debug!("starting scoped pool with {} workers", num_threads);

    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(num_threads);
        for (id, worker_stats) in stats.iter().enumerate() {
            let queue = &queue;
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, id))
                .spawn_scoped(scope, move || {
                    worker::run(id, queue, worker_stats, config.idle_rest)
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers spawned so far see an empty, closed queue and exit.
                    queue.close();
                    return Err(ThreadError::spawn_with_source(
                        id,
                        "Cannot create worker thread",
                        e,
                    ));
                }
            }
        }

        let queued = queue.push_batch(jobs);
        queue.close();
        let queued = queued?;
        log::trace!("queued {} jobs on scoped pool", queued);

        for (id, handle) in handles.into_iter().enumerate() {
            handle
                .join()
                .map_err(|_| ThreadError::join(id, "Worker panicked"))?;
        }
        Ok(())
    })?;

    let summary: WorkerStatSnapshot = stats.iter().map(WorkerStats::snapshot).sum();

    #[cfg(feature = "tracing")]
    crate::tracing::metrics::record_pool_shutdown(
        summary.jobs_processed,
        summary.jobs_failed + summary.jobs_panicked,
    );
    log::debug!(
        "scoped pool finished: {} processed, {} failed, {} panicked",
        summary.jobs_processed,
        summary.jobs_failed,
        summary.jobs_panicked
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BoxedJob, ClosureJob};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_every_job_once() {
        let counter = AtomicUsize::new(0);
        let jobs = (0..50).map(|_| {
            let job: BoxedJob<'_> = Box::new(ClosureJob::new(|| {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }));
            QueuedJob::from(job)
        });

        let summary = run_batch(&ThreadPoolConfig::new(4), jobs).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 50);
        assert_eq!(summary.jobs_processed, 50);
        assert_eq!(summary.jobs_executed(), 50);
    }

    #[test]
    fn test_borrowed_jobs_run_in_lifo_order() {
        let order = parking_lot::Mutex::new(Vec::new());
        let mut slots: Vec<_> = (0..6)
            .map(|i| {
                let order = &order;
                ClosureJob::new(move || {
                    order.lock().push(i);
                    Ok(())
                })
            })
            .collect();

        run_batch(
            &ThreadPoolConfig::new(1),
            slots.iter_mut().map(|job| QueuedJob::Borrowed(job)),
        )
        .unwrap();

        assert_eq!(*order.lock(), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_panics_are_counted_not_propagated() {
        let jobs = (0..4).map(|i| {
            let job: BoxedJob<'_> = Box::new(ClosureJob::new(move || {
                if i % 2 == 0 {
                    panic!("job {} failed", i);
                }
                Ok(())
            }));
            QueuedJob::from(job)
        });

        let summary = run_batch(&ThreadPoolConfig::new(2), jobs).unwrap();
        assert_eq!(summary.jobs_panicked, 2);
        assert_eq!(summary.jobs_processed, 2);
    }

    #[test]
    fn test_empty_batch() {
        let summary = run_batch(&ThreadPoolConfig::new(3), std::iter::empty()).unwrap();
        assert_eq!(summary.jobs_executed(), 0);
    }
}
