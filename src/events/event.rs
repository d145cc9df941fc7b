//! # Run-lifecycle events emitted by composers and the graph runner.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Graph events**: one run of a task graph (started, finished)
//! - **Node events**: per-node execution flow (started, done, failed, skipped)
//! - **Construction events**: composer-level recovery (child skipped)
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! node names and ids, reasons, and per-run counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use frameflow::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NodeFailed)
//!     .with_task("draw-terrain")
//!     .with_node(3)
//!     .with_reason("missing uniform");
//!
//! assert_eq!(ev.kind, EventKind::NodeFailed);
//! assert_eq!(ev.task.as_deref(), Some("draw-terrain"));
//! assert_eq!(ev.node, Some(3));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of run-lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Graph events ===
    /// A graph run began.
    ///
    /// Sets:
    /// - `nodes`: number of nodes in the graph
    GraphStarted,

    /// A graph run drained every node to a terminal state.
    ///
    /// Sets:
    /// - `nodes`: number of nodes in the graph
    /// - `failed`: number of nodes whose `run()` reported failure
    /// - `skipped`: number of nodes never scheduled because a dependency
    ///   failed
    GraphFinished,

    // === Node events ===
    /// A node began running (its dependencies completed and a worker slot
    /// was available).
    ///
    /// Sets:
    /// - `task`: node task name
    /// - `node`: node id within its graph
    NodeStarted,

    /// A node ran to completion successfully.
    ///
    /// Sets:
    /// - `task`: node task name
    /// - `node`: node id
    NodeDone,

    /// A node's `run()` reported failure.
    ///
    /// Sets:
    /// - `task`: node task name
    /// - `node`: node id
    /// - `reason`: failure message
    NodeFailed,

    /// A node was never scheduled because a dependency failed.
    ///
    /// Sets:
    /// - `task`: node task name
    /// - `node`: node id
    /// - `reason`: always "dependency failed"
    NodeSkipped,

    // === Construction events ===
    /// A composer caught a child factory's construction error and omitted
    /// that child from the graph.
    ///
    /// Sets:
    /// - `task`: composer kind ("sequence" or "foreach")
    /// - `node`: child/iteration index
    /// - `reason`: the construction error message
    ChildSkipped,
}

/// Run-lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task or subscriber, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Node id within its graph, or child index for `ChildSkipped`.
    pub node: Option<u32>,
    /// Total node count of the graph run.
    pub nodes: Option<u32>,
    /// Failed-node count of the graph run.
    pub failed: Option<u32>,
    /// Skipped-node count of the graph run.
    pub skipped: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            node: None,
            nodes: None,
            failed: None,
            skipped: None,
        }
    }

    /// Attaches a task or subscriber name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a node id (or child index).
    #[inline]
    pub fn with_node(mut self, node: u32) -> Self {
        self.node = Some(node);
        self
    }

    /// Attaches the graph's node count.
    #[inline]
    pub fn with_nodes(mut self, nodes: u32) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Attaches the run's failed-node count.
    #[inline]
    pub fn with_failed(mut self, failed: u32) -> Self {
        self.failed = Some(failed);
        self
    }

    /// Attaches the run's skipped-node count.
    #[inline]
    pub fn with_skipped(mut self, skipped: u32) -> Self {
        self.skipped = Some(skipped);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::GraphStarted);
        let b = Event::new(EventKind::GraphFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::new(EventKind::GraphFinished)
            .with_nodes(4)
            .with_failed(1)
            .with_skipped(2);
        assert_eq!(ev.nodes, Some(4));
        assert_eq!(ev.failed, Some(1));
        assert_eq!(ev.skipped, Some(2));
        assert!(ev.task.is_none());
    }
}
