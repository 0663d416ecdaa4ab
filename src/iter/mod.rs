//! Blocking parallel iteration over slices.
//!
//! - [`parallel_for`]: one job per element
//! - [`iterate_weighted`]: one job per weight-balanced section
//!
//! Each call starts a pool sized for the call, queues the whole batch, and
//! returns only after that pool has drained and shut down, so callbacks may
//! borrow from the caller's stack. To avoid the thread start-up cost on
//! repeated calls, use [`ThreadPool::parallel_for`] and
//! [`ThreadPool::iterate_weighted`] on a long-lived pool instead.
//!
//! Workers take the most recently queued job first. For [`parallel_for`] that
//! means the highest indices start first: place the most expensive elements
//! at the end of the slice.
//!
//! [`ThreadPool::parallel_for`]: crate::pool::ThreadPool::parallel_for
//! [`ThreadPool::iterate_weighted`]: crate::pool::ThreadPool::iterate_weighted

pub mod dispatch;
mod parallel_for;
pub mod weighted;

pub use dispatch::{ElementFn, ElementFnMut, ElementOnly, Indexed, WithOrigin};
pub use parallel_for::{parallel_for, parallel_for_mut};
pub use weighted::{
    compute_weights, iterate_weighted, iterate_weighted_mut, partition_by_weight, IterSection,
};
