//! # Sequence composer: a strictly ordered pipeline of factories.
//!
//! [`Sequence`] holds an ordered list of child factories and produces a
//! graph in which each surviving child's task depends on the previous one,
//! enforcing left-to-right execution.
//!
//! ## Rules
//! - Exactly one child → the child's task is returned **directly**, with no
//!   wrapping graph. A single-child sequence is transparent to callers
//!   checking for graph emptiness (and the child's construction error, if
//!   any, propagates to the caller).
//! - A child whose construction fails is skipped entirely: not inserted,
//!   not linked, and the chain tail stays on the previous node. Remaining
//!   children still produce.
//! - A child that produces an empty graph is a no-op: not inserted, chain
//!   tail unchanged.
//!
//! ## Example
//! ```
//! use frameflow::{Context, FactoryFn, Sequence, TaskError, TaskFactory, TaskFn, TaskGraph};
//!
//! let step = |name: &'static str| FactoryFn::handle(move |_ctx: &Context| {
//!     Ok(TaskFn::handle(name, || async { Ok::<_, TaskError>(()) }))
//! });
//!
//! let seq = Sequence::new(vec![step("cull"), step("draw"), step("present")]).handle();
//! let task = seq.produce(&Context::detached()).unwrap();
//!
//! let graph = task.downcast::<TaskGraph>();
//! assert_eq!(graph.len(), 3);
//! assert_eq!(graph.edge_count(), 2);
//! ```

use crate::compose::{is_empty_graph, report_child_skipped};
use crate::context::Context;
use crate::error::ProduceError;
use crate::graph::{NodeId, TaskGraph};
use crate::handle::Handle;
use crate::tasks::{FactoryRef, TaskFactory, TaskRef};

/// Factory chaining child factories into a strictly ordered pipeline.
///
/// Immutable after construction except through [`Sequence::swap`].
pub struct Sequence {
    children: Vec<FactoryRef>,
}

impl Sequence {
    /// Creates a sequence over the given children, in execution order.
    pub fn new(children: Vec<FactoryRef>) -> Self {
        Self { children }
    }

    /// Wraps the sequence in a shared factory handle.
    pub fn handle(self) -> FactoryRef {
        Handle::from_arc(std::sync::Arc::new(self))
    }

    /// Exchanges the configuration of two sequences in place.
    ///
    /// Used by hot-reload: a freshly parsed sequence is swapped into a
    /// live one without changing the live factory's identity.
    pub fn swap(&mut self, other: &mut Sequence) {
        std::mem::swap(&mut self.children, &mut other.children);
    }
}

impl TaskFactory for Sequence {
    fn produce(&self, ctx: &Context) -> Result<TaskRef, ProduceError> {
        if self.children.len() == 1 {
            return self.children[0].produce(ctx);
        }

        let mut graph = TaskGraph::new();
        let mut prev: Option<NodeId> = None;
        for (index, child) in self.children.iter().enumerate() {
            match child.produce(ctx) {
                Ok(task) => {
                    if is_empty_graph(&task) {
                        continue;
                    }
                    let id = graph.add_task(task);
                    if let Some(p) = prev {
                        if p != id {
                            graph.add_dependency(id, p);
                        }
                    }
                    prev = Some(id);
                }
                Err(err) => report_child_skipped(ctx, "sequence", index, &err),
            }
        }
        Ok(graph.handle())
    }
}
