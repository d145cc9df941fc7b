//! # Task factory abstraction.
//!
//! A [`TaskFactory`] is the reusable, declarative description of work; a
//! [`Task`](crate::Task) is the concrete per-frame instance it produces.
//! Factories are created once (at resource-load time), live for the
//! application's lifetime, and are invoked once per frame with a fresh
//! [`Context`].
//!
//! ## Contract
//! - `produce` must be side-effect-free with respect to the factory's own
//!   state (safe to call repeatedly, once per iteration or frame), but may
//!   read external mutable state reachable from the context (the visible
//!   node set, variable bindings).
//! - `produce` may fail with a [`ProduceError`] when the context is
//!   structurally incompatible. Enclosing composers absorb such errors and
//!   skip only the offending child; they never reach sibling children.
//!
//! Composite factories are [`Sequence`](crate::Sequence) and
//! [`Foreach`](crate::Foreach); leaves are [`FactoryFn`](crate::FactoryFn)
//! or collaborator impls.

use crate::context::Context;
use crate::error::ProduceError;
use crate::handle::{AsAnyArc, Handle};
use crate::tasks::task::TaskRef;

/// Reusable description that produces a [`Task`](crate::Task) given a
/// context.
pub trait TaskFactory: AsAnyArc {
    /// Produces a fresh task instance for this invocation.
    ///
    /// Called once per frame (or per loop iteration). The returned task may
    /// be a leaf or a whole [`TaskGraph`](crate::TaskGraph).
    fn produce(&self, ctx: &Context) -> Result<TaskRef, ProduceError>;
}

/// Shared handle to a task factory.
pub type FactoryRef = Handle<dyn TaskFactory>;
