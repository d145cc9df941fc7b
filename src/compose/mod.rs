//! Declarative composition of task factories.
//!
//! Two composers cover the composition primitives of the frame
//! description: [`Sequence`] chains children into a strictly ordered
//! pipeline, [`Foreach`] instantiates a child once per matching element of
//! a dynamic collection, serially or in parallel.
//!
//! Both share the same recovery policy: a child's construction error is
//! absorbed on the spot and only that child is omitted, and a child that
//! produces an *empty* graph is treated as a no-op. Neither is linked
//! into the dependency chain, and the chain tail stays where it was.

mod foreach;
mod sequence;

pub use foreach::Foreach;
pub use sequence::Sequence;

use crate::context::Context;
use crate::error::ProduceError;
use crate::events::{Event, EventKind};
use crate::graph::TaskGraph;
use crate::tasks::TaskRef;

/// True if the task is a graph with no nodes.
pub(crate) fn is_empty_graph(task: &TaskRef) -> bool {
    let graph = task.downcast::<TaskGraph>();
    !graph.is_null() && graph.is_empty()
}

/// Reports a skipped child on the invocation's bus, if one is attached.
pub(crate) fn report_child_skipped(
    ctx: &Context,
    composer: &'static str,
    index: usize,
    err: &ProduceError,
) {
    if let Some(bus) = ctx.bus() {
        bus.publish(
            Event::new(EventKind::ChildSkipped)
                .with_task(composer)
                .with_node(index as u32)
                .with_reason(err.as_message()),
        );
    }
}
