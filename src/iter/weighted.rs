//! Weight-balanced parallel iteration.
//!
//! The collection is cut into contiguous sections of roughly equal total
//! weight, one job per section, so scheduling costs one job per worker
//! instead of one per element.
//!
//! # Partition rule
//!
//! With `target = total / workers`, elements are scanned in order while a
//! running sum accumulates their weights. Element `i` is absorbed as long as
//! it is not the last element and `sum + weight(i) <= target`; otherwise the
//! current section is closed *including* element `i`, and the sum restarts
//! at zero with element `i + 1`. The last element always closes a section.
//!
//! Every section but the last weighs more than `target`, so the rule never
//! yields more sections than workers.

use crate::core::{Job, QueuedJob, Result, ThreadError};
use crate::iter::dispatch::{ElementFn, ElementFnMut};
use crate::iter::parallel_for::{batch_outcome, iteration_workers};
use crate::pool::config::ThreadPoolConfig;
use crate::pool::scoped::run_batch;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::Range;

/// A half-open index range `[start, end)` assigned to one job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IterSection {
    /// First index in the section
    pub start: usize,
    /// One past the last index in the section
    pub end: usize,
}

impl IterSection {
    /// Create a section covering `[start, end)`
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of elements in the section
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the section covers no element
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The section as an index range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `index` falls inside the section
    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}

/// Evaluates `weight` once per element, in order.
///
/// Negative weights are treated as zero.
///
/// # Errors
///
/// Returns [`ThreadError::InvalidWeight`] for the first NaN or infinite
/// weight, or for the element whose finite weight pushes the running total
/// past `f64::MAX`.
pub fn compute_weights<T, W>(data: &[T], weight: W) -> Result<Vec<f64>>
where
    W: Fn(&T) -> f64,
{
    let mut weights = Vec::with_capacity(data.len());
    let mut total = 0.0_f64;
    for (index, element) in data.iter().enumerate() {
        let mut value = weight(element);
        if !value.is_finite() {
            return Err(ThreadError::invalid_weight(index, value));
        }
        if value < 0.0 {
            log::warn!("negative weight {} at index {} treated as 0", value, index);
            value = 0.0;
        }
        total += value;
        if !total.is_finite() {
            return Err(ThreadError::invalid_weight(index, value));
        }
        weights.push(value);
    }
    Ok(weights)
}

/// Splits `weights.len()` elements into at most `worker_count` contiguous
/// sections of balanced weight.
///
/// The sections are sorted, disjoint, and cover every index exactly once. A
/// `worker_count` of 0 is treated as 1. When every weight is zero, or the
/// weights do not add up to a finite total, the elements are balanced by count
/// instead.
///
/// ```rust
/// use rust_parallel_pool::iter::{partition_by_weight, IterSection};
///
/// let sections = partition_by_weight(&[1.0; 10], 3);
/// assert_eq!(
///     sections,
///     vec![
///         IterSection::new(0, 4),
///         IterSection::new(4, 8),
///         IterSection::new(8, 10),
///     ]
/// );
/// ```
pub fn partition_by_weight(weights: &[f64], worker_count: usize) -> Vec<IterSection> {
    let len = weights.len();
    if len == 0 {
        return Vec::new();
    }
    let workers = worker_count.clamp(1, len);

    let total: f64 = weights.iter().sum();
    if !total.is_finite() {
        log::warn!("total weight {} is not finite, balancing by count", total);
        return partition_by_weight(&vec![1.0; len], workers);
    }
    if total <= 0.0 {
        return partition_by_weight(&vec![1.0; len], workers);
    }
    let target = total / workers as f64;

    let mut sections = Vec::with_capacity(workers);
    let mut accumulated = 0.0;
    let mut start = 0;
    for (index, &weight) in weights.iter().enumerate() {
        let is_last = index + 1 == len;
        if !is_last && accumulated + weight <= target {
            accumulated += weight;
            continue;
        }
        sections.push(IterSection::new(start, index + 1));
        accumulated = 0.0;
        start = index + 1;
    }

    // Float rounding in `total` could in principle leave one section too many.
    while sections.len() > workers {
        if let Some(last) = sections.pop() {
            if let Some(previous) = sections.last_mut() {
                previous.end = last.end;
            }
        }
    }

    #[cfg(feature = "tracing")]
    crate::tracing::metrics::record_partition(len, sections.len(), total);
    log::trace!(
        "partitioned {} elements (total weight {}) into {} sections",
        len,
        total,
        sections.len()
    );

    sections
}

/// Runs the callback over one section, in increasing index order.
struct SectionJob<'a, T, F, M> {
    callback: &'a F,
    data: &'a [T],
    section: IterSection,
    _shape: PhantomData<fn() -> M>,
}

impl<T, F, M> Job for SectionJob<'_, T, F, M>
where
    T: Sync,
    F: ElementFn<T, M>,
{
    fn execute(&mut self) -> Result<()> {
        for index in self.section.range() {
            self.callback.invoke(&self.data[index], index, self.data);
        }
        Ok(())
    }

    fn job_type(&self) -> &str {
        "SectionJob"
    }
}

/// Runs the callback over one exclusively borrowed section.
struct SectionJobMut<'a, T, F, M> {
    callback: &'a F,
    chunk: &'a mut [T],
    offset: usize,
    _shape: PhantomData<fn() -> M>,
}

impl<T, F, M> Job for SectionJobMut<'_, T, F, M>
where
    T: Send,
    F: ElementFnMut<T, M>,
{
    fn execute(&mut self) -> Result<()> {
        for (i, element) in self.chunk.iter_mut().enumerate() {
            self.callback.invoke_mut(element, self.offset + i);
        }
        Ok(())
    }

    fn job_type(&self) -> &str {
        "SectionJobMut"
    }
}

/// Calls `callback` for every element of `data`, in weight-balanced sections.
///
/// `weight` is called once per element, sequentially, before any callback
/// runs. It must return a finite, non-negative cost estimate; negative values
/// count as zero. The collection is split by [`partition_by_weight`] for a
/// pool of `worker_count` threads (0 = one per core, never more than
/// `data.len()`), one job per section. Within a section elements are visited
/// in increasing index order. The call returns once the pool has drained and
/// shut down. An empty `data` returns immediately.
///
/// `callback` takes the same shapes as for
/// [`parallel_for`](crate::iter::parallel_for).
///
/// # Errors
///
/// - [`ThreadError::InvalidWeight`] if `weight` returns NaN or an infinity,
///   or the weights overflow when summed; no callback runs in that case
/// - [`ThreadError::SpawnError`] if a worker thread cannot be started
/// - [`ThreadError::JobsPanicked`] if a callback panicked; the rest of that
///   section is skipped, other sections still run
///
/// # Example
///
/// ```rust
/// use rust_parallel_pool::iter::iterate_weighted;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let sizes = vec![1usize, 50, 3, 200, 7, 9];
/// let total = AtomicUsize::new(0);
///
/// iterate_weighted(
///     |size: &usize| {
///         total.fetch_add(*size, Ordering::Relaxed);
///     },
///     |size: &usize| *size as f64,
///     3,
///     &sizes,
/// )
/// .unwrap();
///
/// assert_eq!(total.into_inner(), 270);
/// ```
pub fn iterate_weighted<T, F, M, W>(
    callback: F,
    weight: W,
    worker_count: usize,
    data: &[T],
) -> Result<()>
where
    T: Sync,
    F: ElementFn<T, M>,
    W: Fn(&T) -> f64,
{
    if data.is_empty() {
        return Ok(());
    }
    let weights = compute_weights(data, weight)?;
    let workers = iteration_workers(worker_count, data.len());
    let sections = partition_by_weight(&weights, workers);
    let total = sections.len();
    log::debug!(
        "iterate_weighted over {} elements: {} sections on {} workers",
        data.len(),
        total,
        workers
    );

    let callback = &callback;
    let jobs = sections.into_iter().map(|section| {
        QueuedJob::Owned(Box::new(SectionJob {
            callback,
            data,
            section,
            _shape: PhantomData,
        }))
    });

    let summary = run_batch(&ThreadPoolConfig::new(workers), jobs)?;
    batch_outcome(&summary, total)
}

/// Weight-balanced iteration with exclusive access to each element.
///
/// Same partitioning, pool and error behavior as [`iterate_weighted`];
/// `callback` may take `(element)` or `(element, index)`.
pub fn iterate_weighted_mut<T, F, M, W>(
    callback: F,
    weight: W,
    worker_count: usize,
    data: &mut [T],
) -> Result<()>
where
    T: Send,
    F: ElementFnMut<T, M>,
    W: Fn(&T) -> f64,
{
    if data.is_empty() {
        return Ok(());
    }
    let weights = compute_weights(data, weight)?;
    let workers = iteration_workers(worker_count, data.len());
    let sections = partition_by_weight(&weights, workers);
    let total = sections.len();

    let callback = &callback;
    let mut jobs = Vec::with_capacity(total);
    let mut rest = data;
    for section in &sections {
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(section.len());
        rest = tail;
        jobs.push(QueuedJob::Owned(Box::new(SectionJobMut {
            callback,
            chunk,
            offset: section.start,
            _shape: PhantomData,
        })));
    }
    debug_assert!(rest.is_empty());

    let summary = run_batch(&ThreadPoolConfig::new(workers), jobs)?;
    batch_outcome(&summary, total)
}
