//! # Rust Parallel Pool
//!
//! A fixed-size worker thread pool with a LIFO job queue, plus blocking
//! parallel iteration over slices built on top of it.
//!
//! ## Features
//!
//! - **Thread Pool**: Fixed worker count, spawned at construction, drained on shutdown
//! - **LIFO Queue**: The most recently submitted job runs next
//! - **Parallel For**: One job per element, callbacks may borrow from the caller
//! - **Weighted Iteration**: Contiguous sections balanced by a caller-supplied cost
//! - **Worker Statistics**: Track job processing metrics per worker
//! - **Graceful Shutdown**: Every queued job runs before shutdown returns
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_parallel_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Workers start immediately
//! let pool = ThreadPool::with_threads(4)?;
//!
//! // Submit jobs
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! // Shutdown gracefully
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Parallel Iteration
//!
//! ```rust
//! use rust_parallel_pool::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! # fn main() -> Result<()> {
//! let data: Vec<u64> = (0..1000).collect();
//! let sum = AtomicU64::new(0);
//!
//! // One job per element; 0 workers = one per core
//! parallel_for(
//!     |value: &u64| {
//!         sum.fetch_add(*value, Ordering::Relaxed);
//!     },
//!     0,
//!     &data,
//! )?;
//!
//! // One job per section, balanced by weight
//! iterate_weighted(
//!     |value: &u64, index: usize| assert_eq!(*value, index as u64),
//!     |value: &u64| (*value % 10) as f64,
//!     4,
//!     &data,
//! )?;
//!
//! assert_eq!(sum.into_inner(), 499_500);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Pool Configuration
//!
//! ```rust
//! use rust_parallel_pool::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = ThreadPoolConfig::new(8)
//!     .with_idle_rest(Duration::from_millis(10))
//!     .with_thread_name_prefix("my-worker");
//!
//! let pool = ThreadPool::with_config(config)?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use rust_parallel_pool::prelude::*;
//!
//! struct MyJob {
//!     data: String,
//! }
//!
//! impl Job for MyJob {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Processing: {}", self.data);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "MyJob"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::with_threads(2)?;
//! pool.submit(MyJob {
//!     data: "test".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Worker Statistics
//!
//! ```rust
//! use rust_parallel_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::with_threads(2)?;
//! # for _ in 0..10 {
//! #     pool.execute(|| Ok(()))?;
//! # }
//! pool.wait_for_finish();
//!
//! let stats = pool.get_stats();
//! for (i, stat) in stats.iter().enumerate() {
//!     println!("Worker {}: {} jobs processed", i, stat.get_jobs_processed());
//! }
//!
//! assert_eq!(pool.total_jobs_processed(), 10);
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod iter;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod tracing;

pub use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use crate::iter::{iterate_weighted, parallel_for, IterSection};
pub use crate::pool::{ThreadPool, ThreadPoolConfig, WorkerStats};
