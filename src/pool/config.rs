//! Pool configuration and worker-count resolution.

use crate::core::{Result, ThreadError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Process-wide default worker count; 0 means "use the CPU core count".
static DEFAULT_THREAD_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Number of logical CPU cores on this machine.
pub fn detect_core_count() -> usize {
    num_cpus::get()
}

/// Process-wide default worker count used when a pool is asked for 0 threads.
///
/// Returns 0 when no default has been set, in which case pools fall back to
/// [`detect_core_count`].
pub fn default_thread_count() -> usize {
    DEFAULT_THREAD_COUNT.load(Ordering::Relaxed)
}

/// Sets the process-wide default worker count, read at every pool construction.
///
/// Pass 0 to go back to the CPU core count. Setting this to one less than the
/// core count keeps a machine responsive during long parallel sections.
pub fn set_default_thread_count(count: usize) {
    DEFAULT_THREAD_COUNT.store(count, Ordering::Relaxed);
}

/// Resolves a requested worker count: 0 falls back to the process-wide default,
/// then to the core count, and the result is never below 1.
pub fn resolve_thread_count(requested: usize) -> usize {
    let count = match requested {
        0 => match default_thread_count() {
            0 => detect_core_count(),
            default => default,
        },
        n => n,
    };
    count.max(1)
}

/// Configuration for thread pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPoolConfig {
    /// Number of worker threads (0 = process default, then number of CPUs)
    pub num_threads: usize,
    /// Longest time an idle worker parks before polling the queue again.
    /// Default: zero (park until work arrives or shutdown is requested)
    pub idle_rest: Duration,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            idle_rest: Duration::ZERO,
            thread_name_prefix: "worker".to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration with specified number of threads
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the idle rest.
    ///
    /// # Trade-offs
    ///
    /// - **Zero** (default): idle workers sleep until a submission or shutdown
    ///   wakes them
    /// - **Non-zero**: idle workers also wake up on their own after this long,
    ///   which is useful for pools that sit idle most of the time
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_idle_rest(mut self, rest: Duration) -> Self {
        self.idle_rest = rest;
        self
    }

    /// Set the idle rest from a number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidConfig`] if `seconds` is negative, NaN or
    /// too large to represent.
    pub fn with_idle_rest_secs(self, seconds: f64) -> Result<Self> {
        let rest = Duration::try_from_secs_f64(seconds).map_err(|e| {
            ThreadError::invalid_config("idle_rest", format!("{} seconds: {}", seconds, e))
        })?;
        Ok(self.with_idle_rest(rest))
    }

    /// Worker count a pool built from this configuration will spawn.
    pub fn resolved_threads(&self) -> usize {
        resolve_thread_count(self.num_threads)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.contains('\0') {
            return Err(ThreadError::invalid_config(
                "thread_name_prefix",
                "Thread names must not contain NUL bytes",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_count_is_kept() {
        assert_eq!(resolve_thread_count(3), 3);
        assert_eq!(ThreadPoolConfig::new(7).resolved_threads(), 7);
    }

    #[test]
    fn test_zero_resolves_to_cores() {
        // The process-wide default is only changed in its own test binary.
        assert_eq!(default_thread_count(), 0);
        assert_eq!(resolve_thread_count(0), detect_core_count().max(1));
        assert!(ThreadPoolConfig::default().resolved_threads() >= 1);
    }

    #[test]
    fn test_idle_rest_secs() {
        let config = ThreadPoolConfig::new(2).with_idle_rest_secs(0.25).unwrap();
        assert_eq!(config.idle_rest, Duration::from_millis(250));

        let config = ThreadPoolConfig::new(2).with_idle_rest_secs(0.0).unwrap();
        assert!(config.idle_rest.is_zero());
    }

    #[test]
    fn test_idle_rest_secs_rejects_invalid() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let result = ThreadPoolConfig::new(2).with_idle_rest_secs(bad);
            assert!(matches!(result, Err(ThreadError::InvalidConfig { .. })));
        }
    }

    #[test]
    fn test_validate_rejects_nul_prefix() {
        let config = ThreadPoolConfig::new(1).with_thread_name_prefix("bad\0name");
        assert!(config.validate().is_err());
        assert!(ThreadPoolConfig::new(1).validate().is_ok());
    }

    #[test]
    fn test_config_serializes() {
        let config = ThreadPoolConfig::new(4)
            .with_thread_name_prefix("render")
            .with_idle_rest(Duration::from_millis(10));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"thread_name_prefix\":\"render\""));

        let decoded: ThreadPoolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }
}
