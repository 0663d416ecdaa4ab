//! Tracing integration for observability.
//!
//! This module provides structured events and span propagation when the
//! `tracing` feature is enabled. Without the feature, [`TracedJob`] is a plain
//! pass-through wrapper and the crate only logs through the `log` facade.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_parallel_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_parallel_pool=debug".parse().unwrap()))
//!     .init();
//!
//! let pool = ThreadPool::with_threads(4)?;
//!
//! // Submit with tracing context propagation
//! pool.submit_traced(MyJob::new())?;
//! ```

use crate::core::{Job, Result};

/// A job wrapper that propagates tracing context across thread boundaries.
///
/// When a job is wrapped in `TracedJob`, the current tracing span is captured
/// at submission time and entered when the job executes, so events emitted by
/// the job nest under the submitter's span even though a worker runs it.
pub struct TracedJob<J: Job> {
    inner: J,
    #[cfg(feature = "tracing")]
    span: ::tracing::Span,
}

impl<J: Job> TracedJob<J> {
    /// Creates a new TracedJob wrapping the given job.
    ///
    /// The current tracing span is captured and will be entered
    /// when the job executes.
    pub fn new(job: J) -> Self {
        Self {
            inner: job,
            #[cfg(feature = "tracing")]
            span: ::tracing::Span::current(),
        }
    }

    /// Creates a TracedJob with a specific span.
    #[cfg(feature = "tracing")]
    pub fn with_span(job: J, span: ::tracing::Span) -> Self {
        Self { inner: job, span }
    }

    /// Unwraps the inner job.
    pub fn into_inner(self) -> J {
        self.inner
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
#[cfg(feature = "tracing")]
pub mod metrics {
    use std::time::Duration;

    /// Records a job submission event.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        ::tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            ::tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            ::tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed"
            );
        }
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        ::tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        ::tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        ::tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, pool_kind: &str) {
        ::tracing::info!(
            workers = num_workers,
            pool_kind = pool_kind,
            "thread pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_processed: u64, jobs_failed: u64) {
        ::tracing::info!(
            jobs_processed = jobs_processed,
            jobs_failed = jobs_failed,
            "thread pool shutdown complete"
        );
    }

    /// Records the outcome of a weighted partition.
    #[inline]
    pub fn record_partition(elements: usize, sections: usize, total_weight: f64) {
        ::tracing::debug!(
            elements = elements,
            sections = sections,
            total_weight = total_weight,
            "weighted partition computed"
        );
    }
}
