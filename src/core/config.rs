//! # Scheduler configuration.
//!
//! [`SchedulerConfig`] defines the scheduler's behavior: the worker-pool
//! bound for leaf task execution and the event bus capacity.
//!
//! # Example
//! ```
//! use frameflow::SchedulerConfig;
//!
//! let mut cfg = SchedulerConfig::default();
//! cfg.workers = 4;
//! cfg.bus_capacity = 256;
//!
//! assert_eq!(cfg.workers, 4);
//! ```

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// The worker bound is a throughput knob, not a correctness concern:
/// dependency edges alone decide what may run concurrently.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Maximum number of leaf tasks running concurrently (0 = unbounded).
    ///
    /// Nested graphs do not occupy a worker slot while their children run,
    /// so any positive bound is deadlock-free regardless of nesting depth.
    pub workers: usize,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for SchedulerConfig {
    /// Provides a default configuration:
    /// - `workers = 0` (unbounded)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            workers: 0,
            bus_capacity: 1024,
        }
    }
}
