//! Pending-job queue shared between a pool and its workers.
//!
//! The queue is a single mutex-guarded vector of [`QueuedJob`] handles. Jobs are
//! appended at the tail and workers also pop from the tail, so the most recently
//! submitted job runs next (LIFO). Parallel iteration relies on this order: the
//! element with the highest index is dispatched first, which is why callers should
//! place their most expensive elements at the end of a collection.
//!
//! Besides the pending jobs the queue owns the two pieces of state that must be
//! observed together with them:
//!
//! - the **closed** flag (the pool's shutdown request), which flips from `false`
//!   to `true` exactly once and is written under the queue lock, and
//! - the **in-flight** counter of popped jobs that have not finished yet.
//!
//! A worker only exits after seeing, under the lock, an empty queue *and* the
//! closed flag, so closing never strands queued work.
//!
//! [`QueuedJob`]: crate::core::QueuedJob

mod lifo;

pub use lifo::JobQueue;
