//! Error types used by the frameflow scheduler and tasks.
//!
//! This module defines the crate's error taxonomy:
//!
//! - [`ProduceError`] — a factory cannot produce a task from the given
//!   context (construction error). Recovered locally: the immediately
//!   enclosing composer skips the offending child or iteration.
//! - [`TaskError`] — a task's `run()` reported failure (execution error).
//!   Never retried; surfaced through the graph run's summary.
//! - [`GraphError`] — summary result of one graph run.
//! - [`SchedulerError`] — failure of a whole frame entry (root production
//!   or graph run).
//!
//! Ownership-contract violations (null handle dereference, cast misuse,
//! dependency edges to non-member nodes, dependency cycles) are **not**
//! represented here. They are programming errors and panic immediately.
//!
//! All types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use thiserror::Error;

/// # Errors raised while producing a task from a factory.
///
/// Construction errors are recoverable by design: a [`Sequence`] or
/// [`Foreach`] composer catches them and skips only the offending child,
/// so a frame with partially failing factories degrades gracefully instead
/// of losing the whole frame.
///
/// [`Sequence`]: crate::Sequence
/// [`Foreach`]: crate::Foreach
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ProduceError {
    /// The context carries no owning collection to resolve against.
    #[error("context has no owning node set")]
    UnresolvedContext,

    /// The owning collection has no elements matching the requested flag.
    #[error("no nodes matching flag {flag:?}")]
    UnresolvedCollection {
        /// The selector flag that failed to resolve.
        flag: String,
    },

    /// A leaf factory failed for a reason of its own.
    #[error("factory failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl ProduceError {
    /// Creates a leaf-supplied construction error.
    pub fn failed(error: impl Into<String>) -> Self {
        ProduceError::Failed { error: error.into() }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use frameflow::ProduceError;
    ///
    /// let err = ProduceError::UnresolvedContext;
    /// assert_eq!(err.as_label(), "produce_unresolved_context");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProduceError::UnresolvedContext => "produce_unresolved_context",
            ProduceError::UnresolvedCollection { .. } => "produce_unresolved_collection",
            ProduceError::Failed { .. } => "produce_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ProduceError::UnresolvedContext => "no owning node set in context".to_string(),
            ProduceError::UnresolvedCollection { flag } => format!("no nodes for flag {flag:?}"),
            ProduceError::Failed { error } => format!("error: {error}"),
        }
    }
}

/// # Errors produced by task execution.
///
/// A task's `run()` either succeeds or fails; there is no retry in this
/// core. Failure of one node never cancels independent branches of the
/// graph, but every node depending on the failed one is skipped.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Creates an execution error from any displayable reason.
    pub fn failed(error: impl Into<String>) -> Self {
        TaskError::Failed { error: error.into() }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Failed { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Failed { error } => format!("error: {error}"),
        }
    }
}

/// # Summary result of one graph run.
///
/// Reported when at least one node failed. Branches sharing no dependency
/// edge with a failed node still ran to completion; dependents of failed
/// nodes were skipped and are counted here.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    /// One or more nodes failed during the run.
    #[error("{} node(s) failed ({failed:?}), {skipped} skipped", .failed.len())]
    NodesFailed {
        /// Names of the nodes whose `run()` reported failure.
        failed: Vec<String>,
        /// Number of nodes never scheduled because a dependency failed.
        skipped: usize,
    },
}

impl GraphError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use frameflow::GraphError;
    ///
    /// let err = GraphError::NodesFailed { failed: vec!["draw".into()], skipped: 2 };
    /// assert_eq!(err.as_label(), "graph_nodes_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GraphError::NodesFailed { .. } => "graph_nodes_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            GraphError::NodesFailed { failed, skipped } => {
                format!("failed={failed:?} skipped={skipped}")
            }
        }
    }
}

/// # Failure of a whole frame entry.
///
/// Returned by [`Scheduler::run_frame`](crate::Scheduler::run_frame): either
/// the root factory could not produce at all, or the produced graph run
/// reported failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The root factory raised a construction error.
    ///
    /// There is no composer above the root to absorb it, so it surfaces
    /// here and the frame produces nothing.
    #[error(transparent)]
    Produce(#[from] ProduceError),

    /// The produced graph ran, but some nodes failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::Produce(e) => e.as_label(),
            SchedulerError::Graph(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::Produce(e) => e.as_message(),
            SchedulerError::Graph(e) => e.as_message(),
        }
    }
}
