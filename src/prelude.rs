//! Convenient re-exports for common types and traits

pub use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use crate::iter::{
    iterate_weighted, iterate_weighted_mut, parallel_for, parallel_for_mut, IterSection,
};
pub use crate::pool::{detect_core_count, ThreadPool, ThreadPoolConfig, WorkerStats};
