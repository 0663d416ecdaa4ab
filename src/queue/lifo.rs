//! Mutex-guarded LIFO job queue.

use crate::core::{QueuedJob, Result, ThreadError};
use crossbeam_utils::CachePadded;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Pending jobs plus the shutdown flag and in-flight counter of one pool.
///
/// The lifetime `'a` bounds the jobs the queue may hold: a long-lived
/// [`ThreadPool`](crate::pool::ThreadPool) uses `JobQueue<'static>`, while the
/// per-call pools behind [`parallel_for`](crate::iter::parallel_for) borrow the
/// caller's data for the duration of the call.
///
/// # Example
///
/// ```rust
/// use rust_parallel_pool::core::{BoxedJob, ClosureJob, QueuedJob};
/// use rust_parallel_pool::queue::JobQueue;
///
/// let queue = JobQueue::new();
/// for name in ["first", "second"] {
///     let job: BoxedJob<'_> = Box::new(ClosureJob::with_name(|| Ok(()), name));
///     queue.push(QueuedJob::from(job)).unwrap();
/// }
///
/// // Most recently queued runs first
/// let job = queue.try_pop().unwrap();
/// assert_eq!(job.job_type(), "second");
/// queue.finish();
/// ```
pub struct JobQueue<'a> {
    pending: Mutex<Vec<QueuedJob<'a>>>,
    /// Signalled on push and on close
    work_available: Condvar,
    /// Signalled when the queue is empty and nothing is in flight
    idle: Condvar,
    in_flight: CachePadded<AtomicUsize>,
    closed: CachePadded<AtomicBool>,
}

impl<'a> JobQueue<'a> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            work_available: Condvar::new(),
            idle: Condvar::new(),
            in_flight: CachePadded::new(AtomicUsize::new(0)),
            closed: CachePadded::new(AtomicBool::new(false)),
        }
    }

    /// Appends a job at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::ShuttingDown`] once the queue has been closed; the
    /// job is dropped without running.
    pub fn push(&self, job: QueuedJob<'a>) -> Result<()> {
        let mut pending = self.pending.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(ThreadError::shutting_down(pending.len()));
        }
        pending.push(job);
        drop(pending);

        self.work_available.notify_one();
        Ok(())
    }

    /// Appends every job of `jobs` in iteration order under a single lock.
    ///
    /// Either the whole batch is queued or, if the queue is closed, none of it.
    /// Returns the number of jobs queued.
    pub fn push_batch<I>(&self, jobs: I) -> Result<usize>
    where
        I: IntoIterator<Item = QueuedJob<'a>>,
    {
        let mut pending = self.pending.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(ThreadError::shutting_down(pending.len()));
        }
        let before = pending.len();
        pending.extend(jobs);
        let queued = pending.len() - before;
        drop(pending);

        match queued {
            0 => {}
            1 => {
                self.work_available.notify_one();
            }
            _ => {
                self.work_available.notify_all();
            }
        }
        Ok(queued)
    }

    /// Pops the tail job, parking while the queue is empty.
    ///
    /// Returns `None` only when the queue is empty *and* closed. A popped job is
    /// counted as in flight until [`finish`](Self::finish) is called.
    ///
    /// With a zero `idle_rest` the caller parks until a push or close wakes it;
    /// otherwise each park lasts at most `idle_rest` before the queue is polled
    /// again.
    pub fn pop(&self, idle_rest: Duration) -> Option<QueuedJob<'a>> {
        let mut pending = self.pending.lock();
        loop {
            if let Some(job) = pending.pop() {
                self.in_flight.fetch_add(1, Ordering::AcqRel);
                return Some(job);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            if idle_rest.is_zero() {
                self.work_available.wait(&mut pending);
            } else {
                let _ = self.work_available.wait_for(&mut pending, idle_rest);
            }
        }
    }

    /// Pops the tail job without waiting.
    pub fn try_pop(&self) -> Option<QueuedJob<'a>> {
        let mut pending = self.pending.lock();
        let job = pending.pop()?;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        Some(job)
    }

    /// Marks one popped job as finished.
    pub fn finish(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "finish called without a popped job");

        if previous == 1 {
            // Notify under the lock so a waiter between its check and its park
            // cannot miss the wakeup.
            let pending = self.pending.lock();
            if pending.is_empty() && self.in_flight.load(Ordering::Acquire) == 0 {
                self.idle.notify_all();
            }
        }
    }

    /// Closes the queue: later pushes fail and parked workers are woken.
    ///
    /// Returns `true` for the call that performed the transition.
    pub fn close(&self) -> bool {
        let pending = self.pending.lock();
        let transitioned = self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        drop(pending);

        self.work_available.notify_all();
        transitioned
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of jobs waiting to be popped.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether no job is waiting to be popped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of popped jobs that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Blocks until the queue is empty and no job is in flight.
    ///
    /// Only meaningful when no other thread keeps submitting: a push racing
    /// with this call may or may not be waited for.
    pub fn wait_until_idle(&self) {
        let mut pending = self.pending.lock();
        while !(pending.is_empty() && self.in_flight.load(Ordering::Acquire) == 0) {
            self.idle.wait(&mut pending);
        }
    }
}

impl Default for JobQueue<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JobQueue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("pending", &self.len())
            .field("in_flight", &self.in_flight())
            .field("closed", &self.is_closed())
            .finish()
    }
}
