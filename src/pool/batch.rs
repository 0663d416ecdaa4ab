//! Self-contained iteration batches on a long-lived pool.
//!
//! A batch borrows the caller's callback and data, so its jobs cannot outlive
//! the submitting call. Completion is tracked by a [`BatchLatch`] owned by the
//! batch rather than by pool teardown: the submitting call blocks until every
//! job of its batch has counted down, and only then releases the borrows.

use crate::core::{BoxedJob, Job, QueuedJob, Result, ThreadError};
use crate::iter::dispatch::ElementFn;
use crate::pool::thread_pool::ThreadPool;
use parking_lot::{Condvar, Mutex};
use std::marker::PhantomData;
use std::ops::Range;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug)]
struct LatchState {
    remaining: usize,
    panicked: usize,
}

/// Countdown of the jobs of one batch that have not finished yet.
#[derive(Debug)]
pub(crate) struct BatchLatch {
    state: Mutex<LatchState>,
    done: Condvar,
}

impl BatchLatch {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            state: Mutex::new(LatchState {
                remaining: count,
                panicked: 0,
            }),
            done: Condvar::new(),
        }
    }

    pub(crate) fn count_down(&self, panicked: bool) {
        let mut state = self.state.lock();
        state.remaining -= 1;
        if panicked {
            state.panicked += 1;
        }
        if state.remaining == 0 {
            self.done.notify_all();
        }
    }

    /// Blocks until the count reaches zero; returns how many jobs panicked.
    pub(crate) fn wait(&self) -> usize {
        let mut state = self.state.lock();
        while state.remaining > 0 {
            self.done.wait(&mut state);
        }
        state.panicked
    }
}

/// Runs the callback over one index range of a borrowed slice.
///
/// Holds raw pointers because the job is queued with an erased lifetime; see
/// [`ThreadPool::run_ranges`].
struct RangeJob<'b, T, F, M> {
    callback: *const F,
    data: *const T,
    len: usize,
    range: Range<usize>,
    latch: Arc<BatchLatch>,
    _borrow: PhantomData<(&'b F, &'b [T], fn() -> M)>,
}

// SAFETY: the pointers are only dereferenced as `&F` and `&[T]`, which are
// `Send` under exactly these bounds.
unsafe impl<T: Sync, F: Sync, M> Send for RangeJob<'_, T, F, M> {}

impl<'b, T, F, M> Job for RangeJob<'b, T, F, M>
where
    T: Sync,
    F: ElementFn<T, M>,
{
    fn execute(&mut self) -> Result<()> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            // SAFETY: the submitting call blocks on `latch` until this job has
            // counted down, so the callback and the slice are still borrowed.
            let (callback, data) = unsafe {
                (
                    &*self.callback,
                    std::slice::from_raw_parts(self.data, self.len),
                )
            };
            for index in self.range.clone() {
                callback.invoke(&data[index], index, data);
            }
        }));

        // Last access to the borrowed data happened above.
        self.latch.count_down(outcome.is_err());

        if let Err(payload) = outcome {
            resume_unwind(payload);
        }
        Ok(())
    }

    fn job_type(&self) -> &str {
        "RangeJob"
    }
}

/// Extends a job's lifetime to `'static` so it fits a long-lived queue.
///
/// # Safety
///
/// The caller must not let anything the job borrows go away before the job
/// has finished executing or has been dropped unexecuted.
unsafe fn erase_lifetime<'b>(job: BoxedJob<'b>) -> BoxedJob<'static> {
    std::mem::transmute::<BoxedJob<'b>, BoxedJob<'static>>(job)
}

impl ThreadPool {
    /// Queues one job per range, all in one locked batch, and blocks until the
    /// batch has finished.
    ///
    /// # Errors
    ///
    /// - [`ThreadError::ShuttingDown`] if the pool no longer accepts work; no
    ///   job of the batch has run in that case
    /// - [`ThreadError::JobsPanicked`] if any range panicked
    pub(crate) fn run_ranges<T, F, M>(
        &self,
        callback: &F,
        data: &[T],
        ranges: Vec<Range<usize>>,
    ) -> Result<()>
    where
        T: Sync,
        F: ElementFn<T, M>,
    {
        let total = ranges.len();
        if total == 0 {
            return Ok(());
        }

        let latch = Arc::new(BatchLatch::new(total));
        let jobs: Vec<QueuedJob<'static>> = ranges
            .into_iter()
            .map(|range| {
                debug_assert!(range.end <= data.len());
                let job: BoxedJob<'_> = Box::new(RangeJob::<'_, T, F, M> {
                    callback,
                    data: data.as_ptr(),
                    len: data.len(),
                    range,
                    latch: Arc::clone(&latch),
                    _borrow: PhantomData,
                });
                // SAFETY: `push_batch` either queues the whole batch, after
                // which we wait on the latch below before returning, or queues
                // nothing and the jobs are dropped unexecuted here.
                QueuedJob::Owned(unsafe { erase_lifetime(job) })
            })
            .collect();

        self.push_jobs(jobs)?;

        let panicked = latch.wait();
        if panicked > 0 {
            return Err(ThreadError::jobs_panicked(panicked, total));
        }
        Ok(())
    }
}
