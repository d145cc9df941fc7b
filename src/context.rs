//! # Execution context threaded through factory invocation.
//!
//! A [`Context`] is the ambient state a factory receives when asked to
//! produce a task: the chain of owning objects for the current invocation,
//! reduced here to the one link composers actually resolve (the owning
//! [`NodeSet`]), plus an optional event bus for construction diagnostics.
//!
//! The scene model itself is an external collaborator. This module only
//! defines the two interfaces the composers consume:
//!
//! - [`SceneNode`] — an element of a dynamic collection, exposing a name
//!   and a visibility flag (used by [`Foreach`](crate::Foreach) culling).
//! - [`NodeSet`] — the owning collection: a node query by flag and the
//!   loop-variable binding sink.
//!
//! ## Binding validity
//! The loop-variable binding (`set_var`) is written by a composer before
//! each child invocation and read by that child **during the same
//! synchronous `produce` call**. It is not valid at task *run* time: two
//! sibling invocations run later as parallel graph nodes would race on it.
//!
//! ## Example
//! ```
//! use frameflow::{Context, Handle, NodeRef, NodeSet, SceneNode};
//!
//! struct Flat { nodes: Vec<NodeRef> }
//!
//! impl NodeSet for Flat {
//!     fn nodes(&self, _flag: &str) -> Vec<NodeRef> { self.nodes.clone() }
//!     fn set_var(&self, _name: &str, _node: NodeRef) {}
//!     fn var(&self, _name: &str) -> Option<NodeRef> { None }
//! }
//!
//! let ctx = Context::new(Handle::from_arc(std::sync::Arc::new(Flat { nodes: vec![] })));
//! assert!(ctx.scene().is_ok());
//! assert!(Context::detached().scene().is_err());
//! ```

use crate::error::ProduceError;
use crate::events::Bus;
use crate::handle::{AsAnyArc, Handle};

/// An element of a dynamic scene collection.
///
/// Implemented by collaborator scene models; the core only reads the name
/// (diagnostics) and the visibility flag (culling).
pub trait SceneNode: AsAnyArc {
    /// Stable, human-readable node name.
    fn name(&self) -> &str;

    /// Whether the node survived the current visibility pass.
    fn is_visible(&self) -> bool;
}

/// Shared handle to a scene element.
pub type NodeRef = Handle<dyn SceneNode>;

/// The owning collection a factory invocation resolves against.
///
/// Implemented by collaborator scene models. `set_var`/`var` form the
/// loop-variable binding sink: valid only during the enclosing `produce`
/// call (see the module docs).
pub trait NodeSet: AsAnyArc {
    /// Returns the elements matching a selector flag, in enumeration
    /// order. Unknown flags yield an empty vector.
    fn nodes(&self, flag: &str) -> Vec<NodeRef>;

    /// Binds a named variable to an element.
    fn set_var(&self, name: &str, node: NodeRef);

    /// Reads a named variable binding, if set.
    fn var(&self, name: &str) -> Option<NodeRef>;
}

/// Ambient ownership chain for one factory invocation.
///
/// Immutable for the duration of the invocation. A context built with
/// [`Context::detached`] carries no owning collection; composers that need
/// one fail with [`ProduceError::UnresolvedContext`], which their enclosing
/// composer absorbs like any other construction error.
#[derive(Clone)]
pub struct Context {
    owner: Handle<dyn NodeSet>,
    bus: Option<Bus>,
}

impl Context {
    /// Creates a context owned by the given collection.
    pub fn new(owner: Handle<dyn NodeSet>) -> Self {
        Self { owner, bus: None }
    }

    /// Creates a context with no owning collection.
    pub fn detached() -> Self {
        Self {
            owner: Handle::null(),
            bus: None,
        }
    }

    /// Returns a copy of this context carrying the given event bus.
    ///
    /// Composers use the bus to report skipped children; a context without
    /// one simply produces no construction events.
    pub fn with_bus(&self, bus: Bus) -> Self {
        Self {
            owner: self.owner.clone(),
            bus: Some(bus),
        }
    }

    /// Resolves the owning collection.
    pub fn scene(&self) -> Result<&dyn NodeSet, ProduceError> {
        self.owner.try_get().ok_or(ProduceError::UnresolvedContext)
    }

    /// The event bus attached to this invocation, if any.
    pub fn bus(&self) -> Option<&Bus> {
        self.bus.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Empty;

    impl NodeSet for Empty {
        fn nodes(&self, _flag: &str) -> Vec<NodeRef> {
            Vec::new()
        }
        fn set_var(&self, _name: &str, _node: NodeRef) {}
        fn var(&self, _name: &str) -> Option<NodeRef> {
            None
        }
    }

    #[test]
    fn test_detached_context_has_no_scene() {
        let ctx = Context::detached();
        assert!(matches!(ctx.scene(), Err(ProduceError::UnresolvedContext)));
    }

    #[test]
    fn test_owned_context_resolves() {
        let ctx = Context::new(Handle::from_arc(Arc::new(Empty)));
        assert!(ctx.scene().is_ok());
        assert!(ctx.bus().is_none());

        let with_bus = ctx.with_bus(Bus::new(8));
        assert!(with_bus.bus().is_some());
        assert!(with_bus.scene().is_ok());
    }
}
