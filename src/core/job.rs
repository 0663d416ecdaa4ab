//! Job trait and related types

use crate::core::error::Result;
use std::fmt;

/// A trait representing a unit of work to be executed by the thread pool
pub trait Job: Send {
    /// Execute the job
    ///
    /// # Errors
    ///
    /// Returns an error if the job execution fails
    fn execute(&mut self) -> Result<()>;

    /// Get the job's type name for debugging and statistics
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob<'a> = Box<dyn Job + 'a>;

/// Who releases a job's storage once it has run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOwnership {
    /// The queue holds the only handle; the worker frees the job after executing it.
    PoolOwned,
    /// The job lives in storage owned by the submitting scope, which frees it
    /// after the pool has drained.
    CallerOwned,
}

/// A job handle as stored in the pending queue.
///
/// A handle is moved out of the queue when popped, so each job runs at most once.
pub enum QueuedJob<'a> {
    /// Heap job handed over to the pool
    Owned(BoxedJob<'a>),
    /// Job borrowed from a caller-owned batch
    Borrowed(&'a mut (dyn Job + 'a)),
}

impl<'a> QueuedJob<'a> {
    /// Runs the wrapped job.
    pub fn execute(&mut self) -> Result<()> {
        match self {
            QueuedJob::Owned(job) => job.execute(),
            QueuedJob::Borrowed(job) => job.execute(),
        }
    }

    /// Type name of the wrapped job.
    pub fn job_type(&self) -> &str {
        match self {
            QueuedJob::Owned(job) => job.job_type(),
            QueuedJob::Borrowed(job) => job.job_type(),
        }
    }

    /// Ownership tag of this handle.
    pub fn ownership(&self) -> JobOwnership {
        match self {
            QueuedJob::Owned(_) => JobOwnership::PoolOwned,
            QueuedJob::Borrowed(_) => JobOwnership::CallerOwned,
        }
    }
}

impl<'a> From<BoxedJob<'a>> for QueuedJob<'a> {
    fn from(job: BoxedJob<'a>) -> Self {
        QueuedJob::Owned(job)
    }
}

impl fmt::Debug for QueuedJob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedJob")
            .field("job_type", &self.job_type())
            .field("ownership", &self.ownership())
            .finish()
    }
}

/// Helper to create a job from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureJob".to_string(),
        }
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(&mut self) -> Result<()> {
        if let Some(closure) = self.closure.take() {
            closure()
        } else {
            Err(crate::core::ThreadError::execution(
                &self.name,
                "already executed, cannot execute twice",
            ))
        }
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}
