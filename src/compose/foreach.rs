//! # Loop composer: one child instantiation per collection element.
//!
//! [`Foreach`] resolves a dynamic collection from the execution context,
//! binds a named loop variable to each matching element in turn, and
//! invokes its child factory once per element. Iterations are serialized
//! with dependency edges unless the composer is marked parallel.
//!
//! ## Rules
//! - The candidate set is the context collection's elements for the
//!   selector flag, filtered to visible elements when culling is enabled.
//! - Exactly one candidate → the variable is bound and the child's task is
//!   returned **directly**, with no wrapping graph (same transparency as a
//!   single-child [`Sequence`](crate::Sequence)).
//! - An iteration whose construction fails is skipped: not inserted, not
//!   linked, and the previous-node pointer used for chaining does not
//!   advance. Remaining iterations still produce.
//! - An iteration producing an empty graph is a no-op, as in a sequence.
//! - The loop-variable binding is only valid during `produce`. Tasks must
//!   capture what they need at construction time; by the time parallel
//!   iterations *run*, the binding is gone.
//!
//! ## Example
//! ```no_run
//! use frameflow::{Context, FactoryFn, Foreach, SceneNode, TaskError, TaskFn};
//!
//! // One draw call per visible shadow caster, iterations free to run
//! // concurrently.
//! let draw_caster = FactoryFn::handle(|ctx: &Context| {
//!     let node = ctx.scene()?.var("caster").ok_or_else(|| {
//!         frameflow::ProduceError::failed("caster not bound")
//!     })?;
//!     let label = format!("draw:{}", node.name());
//!     Ok(TaskFn::handle(label, || async { Ok::<_, TaskError>(()) }))
//! });
//!
//! let factory = Foreach::new("caster", "shadow", draw_caster)
//!     .culling(true)
//!     .parallel(true)
//!     .handle();
//! ```

use crate::compose::{is_empty_graph, report_child_skipped};
use crate::context::{Context, NodeSet, SceneNode};
use crate::error::ProduceError;
use crate::graph::{NodeId, TaskGraph};
use crate::handle::Handle;
use crate::tasks::{FactoryRef, TaskFactory, TaskRef};

/// Factory instantiating a child once per matching collection element.
///
/// Immutable after construction except through [`Foreach::swap`].
pub struct Foreach {
    var: String,
    flag: String,
    cull: bool,
    parallel: bool,
    child: FactoryRef,
}

impl Foreach {
    /// Creates a loop binding `var` to each element matching `flag`, with
    /// culling off and serialized iterations.
    pub fn new(var: impl Into<String>, flag: impl Into<String>, child: FactoryRef) -> Self {
        Self {
            var: var.into(),
            flag: flag.into(),
            cull: false,
            parallel: false,
            child,
        }
    }

    /// Restricts iteration to currently visible elements.
    pub fn culling(mut self, cull: bool) -> Self {
        self.cull = cull;
        self
    }

    /// Allows iterations to run concurrently (no edges between them).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Wraps the loop in a shared factory handle.
    pub fn handle(self) -> FactoryRef {
        Handle::from_arc(std::sync::Arc::new(self))
    }

    /// Exchanges the configuration of two loops in place.
    ///
    /// Used by hot-reload: a freshly parsed loop is swapped into a live
    /// one without changing the live factory's identity.
    pub fn swap(&mut self, other: &mut Foreach) {
        std::mem::swap(&mut self.var, &mut other.var);
        std::mem::swap(&mut self.flag, &mut other.flag);
        std::mem::swap(&mut self.cull, &mut other.cull);
        std::mem::swap(&mut self.parallel, &mut other.parallel);
        std::mem::swap(&mut self.child, &mut other.child);
    }
}

impl TaskFactory for Foreach {
    fn produce(&self, ctx: &Context) -> Result<TaskRef, ProduceError> {
        let scene = ctx.scene()?;

        let mut candidates = scene.nodes(&self.flag);
        if self.cull {
            candidates.retain(|node| node.is_visible());
        }

        if candidates.len() == 1 {
            scene.set_var(&self.var, candidates.remove(0));
            return self.child.produce(ctx);
        }

        let mut graph = TaskGraph::new();
        let mut prev: Option<NodeId> = None;
        for (index, node) in candidates.into_iter().enumerate() {
            scene.set_var(&self.var, node);
            match self.child.produce(ctx) {
                Ok(task) => {
                    if is_empty_graph(&task) {
                        continue;
                    }
                    let id = graph.add_task(task);
                    if !self.parallel {
                        if let Some(p) = prev {
                            if p != id {
                                graph.add_dependency(id, p);
                            }
                        }
                    }
                    prev = Some(id);
                }
                Err(err) => report_child_skipped(ctx, "foreach", index, &err),
            }
        }
        Ok(graph.handle())
    }
}
