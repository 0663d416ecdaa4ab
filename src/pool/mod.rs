//! Thread pool and worker implementations

mod batch;
pub mod config;
pub(crate) mod scoped;
pub mod thread_pool;
pub mod worker;

pub use config::{
    default_thread_count, detect_core_count, resolve_thread_count, set_default_thread_count,
    ThreadPoolConfig,
};
pub use thread_pool::ThreadPool;
pub use worker::{Worker, WorkerStatSnapshot, WorkerStats};
