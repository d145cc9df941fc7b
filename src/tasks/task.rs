//! # Task abstraction.
//!
//! This module defines the [`Task`] trait, one concrete frame-scoped unit
//! of executable work. The common handle type is [`TaskRef`], a
//! [`Handle`](crate::Handle) to a `dyn Task` suitable for sharing across
//! workers.
//!
//! A task is produced fresh by a [`TaskFactory`](crate::TaskFactory) per
//! invocation (typically once per frame) and is never reused across
//! frames; its lifetime is owned by whichever
//! [`TaskGraph`](crate::TaskGraph) holds it as a node, or by the caller if
//! a factory returned it directly.
//!
//! Task bodies are expected to run to completion without internal
//! suspension: there is no cancellation primitive and no cooperative
//! yielding inside a single task.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use frameflow::{Task, TaskError};
//!
//! struct ClearPass;
//!
//! #[async_trait]
//! impl Task for ClearPass {
//!     fn name(&self) -> &str { "clear" }
//!
//!     async fn run(&self) -> Result<(), TaskError> {
//!         // issue the clear...
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::TaskError;
use crate::handle::{AsAnyArc, Handle};

/// # One concrete, frame-scoped unit of executable work.
///
/// A `Task` has a stable [`name`](Task::name) and a single execution entry
/// point, [`run`](Task::run), returning success or failure. Variants are a
/// leaf action ([`TaskFn`](crate::TaskFn) or a user impl) or a whole
/// [`TaskGraph`](crate::TaskGraph), which is itself a task.
///
/// Failure is reported, never retried: the surrounding graph run skips the
/// failed node's dependents and surfaces a summary.
#[async_trait]
pub trait Task: AsAnyArc {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task to completion.
    async fn run(&self) -> Result<(), TaskError>;
}

/// Shared handle to a task.
pub type TaskRef = Handle<dyn Task>;
