//! Error types for the parallel pool

/// Result type for pool and iteration operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the parallel pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// Thread pool is shutting down with job count
    #[error("Thread pool is shutting down ({pending_jobs} jobs pending)")]
    ShuttingDown {
        /// Number of pending jobs
        pending_jobs: usize,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Job execution failed with job details
    #[error("Job execution failed ({job_type}): {message}")]
    ExecutionError {
        /// Type name of the failed job
        job_type: String,
        /// Error message
        message: String,
    },

    /// One or more iteration callbacks panicked
    #[error("{panicked} of {total} jobs panicked during parallel iteration")]
    JobsPanicked {
        /// Number of jobs that panicked
        panicked: usize,
        /// Number of jobs in the iteration
        total: usize,
    },

    /// Weight function produced a value the partitioner cannot use
    #[error("Invalid weight {weight} for element #{index}: weights and their total must be finite")]
    InvalidWeight {
        /// Index of the offending element
        index: usize,
        /// The value returned by the weight function
        weight: f64,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl ThreadError {
    /// Create a shutting down error
    pub fn shutting_down(pending_jobs: usize) -> Self {
        ThreadError::ShuttingDown { pending_jobs }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution(job_type: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::ExecutionError {
            job_type: job_type.into(),
            message: message.into(),
        }
    }

    /// Create a jobs panicked error
    pub fn jobs_panicked(panicked: usize, total: usize) -> Self {
        ThreadError::JobsPanicked { panicked, total }
    }

    /// Create an invalid weight error
    pub fn invalid_weight(index: usize, weight: f64) -> Self {
        ThreadError::InvalidWeight { index, weight }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ThreadError::Other(msg.into())
    }
}
