//! # Task graph: the DAG container.
//!
//! A [`TaskGraph`] owns a set of task nodes and the directed dependency
//! edges between them. An edge `(successor, predecessor)` means "successor
//! must not begin before predecessor completes"; edges are the *only*
//! ordering guarantee a run provides.
//!
//! ## Rules
//! - Nodes are unique per target identity: inserting a task that is already
//!   a member returns the existing [`NodeId`].
//! - Edges may only reference members. An edge to a foreign id, a
//!   self-edge, or a null task handle is an ownership-contract violation
//!   and panics.
//! - A graph with zero nodes is "empty": composers never link it into a
//!   dependency chain, and running it succeeds immediately.
//! - `TaskGraph` is itself a [`Task`], so a graph can be a node of another
//!   graph; the runner recurses into it.
//!
//! ## Example
//! ```
//! use frameflow::{TaskError, TaskFn, TaskGraph};
//!
//! let mut graph = TaskGraph::new();
//! let cull = graph.add_task(TaskFn::handle("cull", || async { Ok::<_, TaskError>(()) }));
//! let draw = graph.add_task(TaskFn::handle("draw", || async { Ok::<_, TaskError>(()) }));
//! graph.add_dependency(draw, cull);
//!
//! assert!(!graph.is_empty());
//! assert_eq!(graph.len(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! assert_eq!(graph.dependencies(draw), &[cull]);
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::graph::runner::{self, Session};
use crate::handle::Handle;
use crate::tasks::{Task, TaskRef};

/// Identifier of a node within one [`TaskGraph`].
///
/// Ids are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) task: TaskRef,
    pub(crate) deps: Vec<NodeId>,
    pub(crate) dependents: Vec<NodeId>,
}

/// DAG of task nodes with explicit dependency edges.
#[derive(Debug, Default)]
pub struct TaskGraph {
    nodes: Vec<Node>,
    edges: usize,
}

impl TaskGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a task as a node and returns its id.
    ///
    /// Inserting a task that is already a member returns the existing id
    /// (nodes are unique per target identity).
    ///
    /// # Panics
    ///
    /// Panics on a null task handle (ownership-contract violation).
    pub fn add_task(&mut self, task: TaskRef) -> NodeId {
        if task.is_null() {
            panic!("null task handle inserted into graph (ownership contract violation)");
        }
        if let Some(existing) = self.node_of(&task) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            task,
            deps: Vec::new(),
            dependents: Vec::new(),
        });
        id
    }

    /// Declares that `successor` must not begin before `predecessor`
    /// completes. Duplicate declarations are ignored.
    ///
    /// # Panics
    ///
    /// Panics if either id is not a member of this graph, or if the two
    /// ids are equal (ownership-contract violation).
    pub fn add_dependency(&mut self, successor: NodeId, predecessor: NodeId) {
        let members = self.nodes.len();
        if successor.0 >= members || predecessor.0 >= members {
            panic!(
                "dependency edge ({successor}, {predecessor}) references a node outside this \
                 graph of {members} node(s) (ownership contract violation)"
            );
        }
        if successor == predecessor {
            panic!("node {successor} cannot depend on itself (ownership contract violation)");
        }
        if self.nodes[successor.0].deps.contains(&predecessor) {
            return;
        }
        self.nodes[successor.0].deps.push(predecessor);
        self.nodes[predecessor.0].dependents.push(successor);
        self.edges += 1;
    }

    /// True iff no nodes were ever inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct dependency edges.
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Looks up the node holding the given task, by target identity.
    pub fn node_of(&self, task: &TaskRef) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.task.ptr_eq(task))
            .map(NodeId)
    }

    /// Returns the task held by a node.
    ///
    /// # Panics
    ///
    /// Panics if the id is not a member of this graph.
    pub fn task(&self, id: NodeId) -> &TaskRef {
        &self.member(id).task
    }

    /// Returns the ids a node depends on, in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if the id is not a member of this graph.
    pub fn dependencies(&self, id: NodeId) -> &[NodeId] {
        &self.member(id).deps
    }

    /// Wraps the finished graph in a shared task handle.
    pub fn handle(self) -> TaskRef {
        Handle::from_arc(std::sync::Arc::new(self))
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn member(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(node) => node,
            None => panic!("node id {id} outside this graph (ownership contract violation)"),
        }
    }
}

#[async_trait]
impl Task for TaskGraph {
    fn name(&self) -> &str {
        "graph"
    }

    /// Runs the graph to completion on a detached session (no worker bound,
    /// no observers). Graphs run by a [`Scheduler`](crate::Scheduler) go
    /// through its session instead and share its worker pool and bus.
    async fn run(&self) -> Result<(), TaskError> {
        runner::execute(self, &Session::detached())
            .await
            .map_err(|e| TaskError::failed(e.as_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;

    fn leaf(name: &'static str) -> TaskRef {
        TaskFn::handle(name, || async { Ok(()) })
    }

    #[test]
    fn test_empty_and_counts() {
        let mut graph = TaskGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);

        let a = graph.add_task(leaf("a"));
        assert!(!graph.is_empty());
        assert_eq!(a.index(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_task_returns_existing_id() {
        let mut graph = TaskGraph::new();
        let task = leaf("a");
        let first = graph.add_task(task.clone());
        let second = graph.add_task(task);
        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_duplicate_edge_is_ignored() {
        let mut graph = TaskGraph::new();
        let a = graph.add_task(leaf("a"));
        let b = graph.add_task(leaf("b"));
        graph.add_dependency(b, a);
        graph.add_dependency(b, a);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies(b), &[a]);
    }

    #[test]
    #[should_panic(expected = "outside this graph")]
    fn test_foreign_edge_panics() {
        let mut other = TaskGraph::new();
        let foreign = other.add_task(leaf("x"));
        let _ = other.add_task(leaf("y"));

        let mut graph = TaskGraph::new();
        let a = graph.add_task(leaf("a"));
        graph.add_dependency(NodeId(foreign.0 + 5), a);
    }

    #[test]
    #[should_panic(expected = "cannot depend on itself")]
    fn test_self_edge_panics() {
        let mut graph = TaskGraph::new();
        let a = graph.add_task(leaf("a"));
        graph.add_dependency(a, a);
    }

    #[test]
    #[should_panic(expected = "null task handle")]
    fn test_null_task_panics() {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskRef::null());
    }
}
