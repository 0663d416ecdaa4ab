//! Uniform per-element parallel iteration.

use crate::core::{Job, QueuedJob, Result, ThreadError};
use crate::iter::dispatch::{ElementFn, ElementFnMut};
use crate::pool::config::{detect_core_count, ThreadPoolConfig};
use crate::pool::scoped::run_batch;
use crate::pool::worker::WorkerStatSnapshot;
use std::marker::PhantomData;

/// One element of a [`parallel_for`] batch.
struct ElementJob<'a, T, F, M> {
    callback: &'a F,
    data: &'a [T],
    index: usize,
    _shape: PhantomData<fn() -> M>,
}

impl<T, F, M> Job for ElementJob<'_, T, F, M>
where
    T: Sync,
    F: ElementFn<T, M>,
{
    fn execute(&mut self) -> Result<()> {
        self.callback
            .invoke(&self.data[self.index], self.index, self.data);
        Ok(())
    }

    fn job_type(&self) -> &str {
        "ElementJob"
    }
}

/// One element of a [`parallel_for_mut`] batch.
struct ElementJobMut<'a, T, F, M> {
    callback: &'a F,
    element: &'a mut T,
    index: usize,
    _shape: PhantomData<fn() -> M>,
}

impl<T, F, M> Job for ElementJobMut<'_, T, F, M>
where
    T: Send,
    F: ElementFnMut<T, M>,
{
    fn execute(&mut self) -> Result<()> {
        self.callback.invoke_mut(self.element, self.index);
        Ok(())
    }

    fn job_type(&self) -> &str {
        "ElementJobMut"
    }
}

/// Worker count for one iteration call over `len` elements.
///
/// 0 means the detected core count. The process-wide default set with
/// [`set_default_thread_count`](crate::pool::set_default_thread_count) only
/// applies to [`ThreadPool`](crate::pool::ThreadPool) construction. The result
/// is clamped to `[1, len]`.
pub(crate) fn iteration_workers(requested: usize, len: usize) -> usize {
    let workers = match requested {
        0 => detect_core_count(),
        n => n,
    };
    workers.min(len).max(1)
}

/// Turns the panic count of a finished batch into the call's result.
pub(crate) fn batch_outcome(summary: &WorkerStatSnapshot, total: usize) -> Result<()> {
    match summary.jobs_panicked {
        0 => Ok(()),
        panicked => Err(ThreadError::jobs_panicked(panicked as usize, total)),
    }
}

/// Calls `callback` once for every element of `data`, in parallel.
///
/// A pool of `worker_count` threads (0 = one per core) is started for
/// this call alone, never larger than `data`. One job per element is queued,
/// and the call returns only after the pool has drained every job and shut
/// down. An empty `data` returns immediately without starting any thread.
///
/// `callback` may take `(element)`, `(element, index)` or
/// `(element, index, data)`; see [`dispatch`](crate::iter::dispatch).
///
/// # Ordering
///
/// Jobs are queued in index order and workers take the newest job first, so
/// the **last** elements start first. Put the most expensive elements at the
/// end of `data`: they start early instead of running alone on one worker
/// after the others have gone idle.
///
/// # Errors
///
/// - [`ThreadError::SpawnError`] if a worker thread cannot be started; no
///   element is processed in that case
/// - [`ThreadError::JobsPanicked`] if any callback panicked; every other
///   element has still been processed exactly once
///
/// # Example
///
/// ```rust
/// use rust_parallel_pool::iter::parallel_for;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// let data: Vec<u64> = (1..=100).collect();
/// let sum = AtomicU64::new(0);
///
/// parallel_for(
///     |value: &u64| {
///         sum.fetch_add(*value, Ordering::Relaxed);
///     },
///     4,
///     &data,
/// )
/// .unwrap();
///
/// assert_eq!(sum.into_inner(), 5050);
/// ```
pub fn parallel_for<T, F, M>(callback: F, worker_count: usize, data: &[T]) -> Result<()>
where
    T: Sync,
    F: ElementFn<T, M>,
{
    if data.is_empty() {
        return Ok(());
    }
    let workers = iteration_workers(worker_count, data.len());
    log::debug!(
        "parallel_for over {} elements on {} workers",
        data.len(),
        workers
    );

    // Caller-owned batch: the jobs live in this frame until the pool is gone.
    let mut jobs: Vec<ElementJob<'_, T, F, M>> = (0..data.len())
        .map(|index| ElementJob {
            callback: &callback,
            data,
            index,
            _shape: PhantomData,
        })
        .collect();

    let summary = run_batch(
        &ThreadPoolConfig::new(workers),
        jobs.iter_mut().map(|job| QueuedJob::Borrowed(job)),
    )?;
    batch_outcome(&summary, data.len())
}

/// Calls `callback` once for every element of `data` with exclusive access to
/// that element.
///
/// Same pool, ordering and error behavior as [`parallel_for`]. `callback` may
/// take `(element)` or `(element, index)`.
///
/// # Example
///
/// ```rust
/// use rust_parallel_pool::iter::parallel_for_mut;
///
/// let mut data = vec![1, 2, 3, 4];
/// parallel_for_mut(|value: &mut i32, index: usize| *value *= index as i32, 2, &mut data)
///     .unwrap();
/// assert_eq!(data, vec![0, 2, 6, 12]);
/// ```
pub fn parallel_for_mut<T, F, M>(callback: F, worker_count: usize, data: &mut [T]) -> Result<()>
where
    T: Send,
    F: ElementFnMut<T, M>,
{
    if data.is_empty() {
        return Ok(());
    }
    let total = data.len();
    let workers = iteration_workers(worker_count, total);
    log::debug!(
        "parallel_for_mut over {} elements on {} workers",
        total,
        workers
    );

    let mut jobs: Vec<ElementJobMut<'_, T, F, M>> = data
        .iter_mut()
        .enumerate()
        .map(|(index, element)| ElementJobMut {
            callback: &callback,
            element,
            index,
            _shape: PhantomData,
        })
        .collect();

    let summary = run_batch(
        &ThreadPoolConfig::new(workers),
        jobs.iter_mut().map(|job| QueuedJob::Borrowed(job)),
    )?;
    batch_outcome(&summary, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_collection_is_noop() {
        let calls = AtomicUsize::new(0);
        let data: Vec<u8> = Vec::new();
        parallel_for(
            |_: &u8| {
                calls.fetch_add(1, Ordering::Relaxed);
            },
            0,
            &data,
        )
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        let mut data: Vec<u8> = Vec::new();
        parallel_for_mut(|_: &mut u8| {}, 4, &mut data).unwrap();
    }

    #[test]
    fn test_each_index_exactly_once() {
        let data: Vec<usize> = (0..257).collect();
        let hits: Vec<AtomicUsize> = (0..data.len()).map(|_| AtomicUsize::new(0)).collect();

        parallel_for(
            |value: &usize, index: usize| {
                assert_eq!(*value, index);
                hits[index].fetch_add(1, Ordering::Relaxed);
            },
            8,
            &data,
        )
        .unwrap();

        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_single_worker_runs_last_element_first() {
        let data = vec!['a', 'b', 'c', 'd'];
        let order = Mutex::new(Vec::new());

        parallel_for(
            |_: &char, index: usize| order.lock().push(index),
            1,
            &data,
        )
        .unwrap();

        assert_eq!(*order.lock(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_origin_shape() {
        let data = vec![3, 1, 4, 1, 5];
        let neighbours = AtomicUsize::new(0);

        parallel_for(
            |value: &i32, index: usize, origin: &[i32]| {
                if index + 1 < origin.len() && origin[index + 1] > *value {
                    neighbours.fetch_add(1, Ordering::Relaxed);
                }
            },
            3,
            &data,
        )
        .unwrap();

        assert_eq!(neighbours.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_mut_visits_every_element() {
        let mut data: Vec<u32> = vec![0; 100];
        parallel_for_mut(|value: &mut u32, index: usize| *value = index as u32 * 2, 4, &mut data)
            .unwrap();
        assert!(data.iter().enumerate().all(|(i, v)| *v == i as u32 * 2));
    }

    #[test]
    fn test_panic_is_reported_after_drain() {
        let data: Vec<u32> = (0..20).collect();
        let visited = AtomicUsize::new(0);

        let result = parallel_for(
            |value: &u32| {
                if *value == 7 {
                    panic!("element 7 is broken");
                }
                visited.fetch_add(1, Ordering::Relaxed);
            },
            4,
            &data,
        );

        assert!(matches!(
            result,
            Err(ThreadError::JobsPanicked {
                panicked: 1,
                total: 20
            })
        ));
        assert_eq!(visited.load(Ordering::Relaxed), 19);
    }

    #[test]
    fn test_iteration_workers() {
        assert_eq!(iteration_workers(8, 3), 3);
        assert_eq!(iteration_workers(2, 10), 2);
        assert_eq!(iteration_workers(0, 1), 1);
        assert_eq!(
            iteration_workers(0, usize::MAX),
            detect_core_count().max(1)
        );
    }
}
