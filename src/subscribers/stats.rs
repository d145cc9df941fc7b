//! # Stateful subscriber that aggregates run outcomes.
//!
//! [`FrameStats`] maintains running counters of graph runs and node
//! outcomes by listening to the scheduler's lifecycle events. Attach it to
//! a [`Scheduler`](crate::Scheduler) and read a [`FrameSnapshot`] whenever
//! a frame budget report or a test assertion needs one.
//!
//! Nested graph nodes recurse through the runner, so a frame whose root
//! contains subgraphs counts one run per graph entered.
//!
//! ## Example
//! ```no_run
//! # use std::sync::Arc;
//! # use frameflow::{FrameStats, Scheduler, SchedulerConfig};
//! # async fn demo() {
//! let stats = Arc::new(FrameStats::new());
//! let scheduler = Scheduler::new(SchedulerConfig::default(), vec![stats.clone()]);
//!
//! // ... run frames ...
//!
//! let snap = stats.snapshot().await;
//! println!("done={} failed={} skipped={}", snap.nodes_done, snap.nodes_failed, snap.nodes_skipped);
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::events::{Event, EventKind};

use super::subscriber::Subscriber;

/// Point-in-time copy of the counters kept by [`FrameStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Graph runs started.
    pub runs_started: u64,
    /// Graph runs drained to completion.
    pub runs_finished: u64,
    /// Nodes that ran to completion successfully.
    pub nodes_done: u64,
    /// Nodes whose `run()` reported failure.
    pub nodes_failed: u64,
    /// Nodes never scheduled because a dependency failed.
    pub nodes_skipped: u64,
    /// Children omitted by composers due to construction errors.
    pub children_skipped: u64,
}

/// Aggregates run-lifecycle events into counters.
///
/// Thread-safe and cloneable - multiple references share the same internal
/// state.
#[derive(Clone, Default)]
pub struct FrameStats {
    inner: Arc<Mutex<FrameSnapshot>>,
}

impl FrameStats {
    /// Creates a new tracker with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current counters.
    pub async fn snapshot(&self) -> FrameSnapshot {
        *self.inner.lock().await
    }

    /// Resets every counter to zero.
    pub async fn reset(&self) {
        *self.inner.lock().await = FrameSnapshot::default();
    }
}

#[async_trait]
impl Subscriber for FrameStats {
    async fn on_event(&self, event: &Event) {
        let mut snap = self.inner.lock().await;
        match event.kind {
            EventKind::GraphStarted => snap.runs_started += 1,
            EventKind::GraphFinished => snap.runs_finished += 1,
            EventKind::NodeDone => snap.nodes_done += 1,
            EventKind::NodeFailed => snap.nodes_failed += 1,
            EventKind::NodeSkipped => snap.nodes_skipped += 1,
            EventKind::ChildSkipped => snap.children_skipped += 1,
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "frame-stats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_follow_events() {
        let stats = FrameStats::new();
        stats.on_event(&Event::new(EventKind::GraphStarted)).await;
        stats.on_event(&Event::new(EventKind::NodeDone)).await;
        stats.on_event(&Event::new(EventKind::NodeFailed)).await;
        stats.on_event(&Event::new(EventKind::NodeSkipped)).await;
        stats.on_event(&Event::new(EventKind::ChildSkipped)).await;
        stats.on_event(&Event::new(EventKind::GraphFinished)).await;

        let snap = stats.snapshot().await;
        assert_eq!(snap.runs_started, 1);
        assert_eq!(snap.runs_finished, 1);
        assert_eq!(snap.nodes_done, 1);
        assert_eq!(snap.nodes_failed, 1);
        assert_eq!(snap.nodes_skipped, 1);
        assert_eq!(snap.children_skipped, 1);

        stats.reset().await;
        assert_eq!(stats.snapshot().await, FrameSnapshot::default());
    }
}
