//! # Graph execution: the scheduler state machine.
//!
//! Runs a [`TaskGraph`] to completion. Per node the state machine is
//! `Pending → Ready → Running → Done`, or `Running → Failed`, or
//! `Pending → Skipped` when a dependency failed. Nodes with no
//! predecessors start Ready; terminal states are Done, Failed, Skipped.
//!
//! ## Flow
//! ```text
//! execute(graph, session)
//!   ├─ publish GraphStarted
//!   ├─ spawn every node with zero unmet dependencies (in id order)
//!   └─ driver loop: join one completion at a time
//!        ├─ Done   → decrement dependents; spawn the newly unblocked
//!        ├─ Failed → poison dependents; unblocked poisoned nodes become
//!        │           Skipped, transitively (their run() is never invoked)
//!        └─ JoinSet drained → publish GraphFinished
//!              ├─ all nodes terminal, none failed → Ok
//!              ├─ some failed → Err(GraphError::NodesFailed)
//!              └─ nodes unreachable → dependency cycle → panic
//! ```
//!
//! ## Rules
//! - Concurrent **leaf** executions are bounded by the session's semaphore
//!   (the worker-pool size). A node that is itself a graph recurses into
//!   the runner without holding a worker slot, so nesting depth cannot
//!   deadlock a small pool.
//! - A worker blocks only while waiting for a slot; task bodies run to
//!   completion with no cancellation.
//! - Failure of one node never cancels branches that do not depend on it.
//! - A panic inside a task is a programming error and is resumed on the
//!   driver, never downgraded to a node failure.
//! - With no parallelism available (a fully serialized chain), completions
//!   arrive one at a time and nodes are visited in insertion order on
//!   every run.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::error::{GraphError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::graph::graph::TaskGraph;
use crate::handle::Handle;
use crate::tasks::{Task, TaskRef};

/// Execution environment for one graph run: the worker bound and the bus
/// lifecycle events go to.
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) semaphore: Option<Arc<Semaphore>>,
    pub(crate) bus: Bus,
}

impl Session {
    pub(crate) fn new(semaphore: Option<Arc<Semaphore>>, bus: Bus) -> Self {
        Self { semaphore, bus }
    }

    /// Unbounded session with an unobserved bus, for graphs run outside a
    /// scheduler.
    pub(crate) fn detached() -> Self {
        Self {
            semaphore: None,
            bus: Bus::new(1),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum NodeState {
    Pending,
    Running,
    Done,
    Failed,
    Skipped,
}

/// Runs a produced task: a graph goes through [`execute`], a single leaf
/// runs as one worker unit.
pub(crate) async fn run_task(task: &TaskRef, session: &Session) -> Result<(), GraphError> {
    let sub = task.downcast::<TaskGraph>();
    if !sub.is_null() {
        return execute(&sub, session).await;
    }

    let _permit = acquire_slot(session).await.map_err(|e| to_summary(task, e))?;
    session
        .bus
        .publish(Event::new(EventKind::NodeStarted).with_task(task.name()));
    match task.run().await {
        Ok(()) => {
            session
                .bus
                .publish(Event::new(EventKind::NodeDone).with_task(task.name()));
            Ok(())
        }
        Err(e) => {
            session.bus.publish(
                Event::new(EventKind::NodeFailed)
                    .with_task(task.name())
                    .with_reason(e.as_message()),
            );
            Err(to_summary(task, e))
        }
    }
}

fn to_summary(task: &TaskRef, _err: TaskError) -> GraphError {
    GraphError::NodesFailed {
        failed: vec![task.name().to_string()],
        skipped: 0,
    }
}

/// Executes a graph to completion, leaving every node in a terminal state.
pub(crate) async fn execute(graph: &TaskGraph, session: &Session) -> Result<(), GraphError> {
    let n = graph.len();
    session
        .bus
        .publish(Event::new(EventKind::GraphStarted).with_nodes(n as u32));

    let nodes = graph.nodes();
    let mut state = vec![NodeState::Pending; n];
    let mut remaining: Vec<usize> = nodes.iter().map(|node| node.deps.len()).collect();
    let mut poisoned = vec![false; n];
    let mut failed: Vec<String> = Vec::new();
    let mut skipped = 0usize;
    let mut terminal = 0usize;

    let mut set: JoinSet<(usize, Result<(), TaskError>)> = JoinSet::new();
    for id in 0..n {
        if remaining[id] == 0 {
            state[id] = NodeState::Running;
            spawn_node(&mut set, nodes[id].task.clone(), session, id);
        }
    }

    while let Some(joined) = set.join_next().await {
        let (id, result) = match joined {
            Ok(done) => done,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => panic!("graph node aborted: {err}"),
        };
        terminal += 1;
        match result {
            Ok(()) => {
                state[id] = NodeState::Done;
                for dep in nodes[id].dependents.clone() {
                    let d = dep.index();
                    remaining[d] -= 1;
                    if remaining[d] == 0 {
                        if poisoned[d] {
                            skip_cascade(
                                graph,
                                d,
                                &mut state,
                                &mut remaining,
                                &mut poisoned,
                                &session.bus,
                                &mut skipped,
                                &mut terminal,
                            );
                        } else {
                            state[d] = NodeState::Running;
                            spawn_node(&mut set, nodes[d].task.clone(), session, d);
                        }
                    }
                }
            }
            Err(_reported) => {
                state[id] = NodeState::Failed;
                failed.push(nodes[id].task.name().to_string());
                for dep in nodes[id].dependents.clone() {
                    let d = dep.index();
                    poisoned[d] = true;
                    remaining[d] -= 1;
                    if remaining[d] == 0 {
                        skip_cascade(
                            graph,
                            d,
                            &mut state,
                            &mut remaining,
                            &mut poisoned,
                            &session.bus,
                            &mut skipped,
                            &mut terminal,
                        );
                    }
                }
            }
        }
    }

    if terminal < n {
        panic!(
            "task graph contains a dependency cycle ({} of {} node(s) unreachable)",
            n - terminal,
            n
        );
    }

    session.bus.publish(
        Event::new(EventKind::GraphFinished)
            .with_nodes(n as u32)
            .with_failed(failed.len() as u32)
            .with_skipped(skipped as u32),
    );

    if failed.is_empty() {
        Ok(())
    } else {
        Err(GraphError::NodesFailed { failed, skipped })
    }
}

/// Marks an unblocked, poisoned node Skipped and settles its dependents
/// transitively. Skipped nodes are terminal; their `run()` is never
/// invoked.
#[allow(clippy::too_many_arguments)]
fn skip_cascade(
    graph: &TaskGraph,
    start: usize,
    state: &mut [NodeState],
    remaining: &mut [usize],
    poisoned: &mut [bool],
    bus: &Bus,
    skipped: &mut usize,
    terminal: &mut usize,
) {
    let nodes = graph.nodes();
    let mut queue = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        if state[id] != NodeState::Pending {
            continue;
        }
        state[id] = NodeState::Skipped;
        *skipped += 1;
        *terminal += 1;
        bus.publish(
            Event::new(EventKind::NodeSkipped)
                .with_task(nodes[id].task.name())
                .with_node(id as u32)
                .with_reason("dependency failed"),
        );
        for dep in &nodes[id].dependents {
            let d = dep.index();
            poisoned[d] = true;
            remaining[d] -= 1;
            if remaining[d] == 0 {
                queue.push_back(d);
            }
        }
    }
}

fn spawn_node(
    set: &mut JoinSet<(usize, Result<(), TaskError>)>,
    task: TaskRef,
    session: &Session,
    id: usize,
) {
    let session = session.clone();
    set.spawn(async move {
        let result = run_node(task, &session, id).await;
        (id, result)
    });
}

async fn run_node(task: TaskRef, session: &Session, id: usize) -> Result<(), TaskError> {
    let sub = task.downcast::<TaskGraph>();
    let result = if sub.is_null() {
        let _permit = match acquire_slot(session).await {
            Ok(permit) => permit,
            Err(e) => return Err(e),
        };
        session.bus.publish(
            Event::new(EventKind::NodeStarted)
                .with_task(task.name())
                .with_node(id as u32),
        );
        task.run().await
    } else {
        // Nested graph: recurse without holding a worker slot so its
        // leaves can take them.
        session.bus.publish(
            Event::new(EventKind::NodeStarted)
                .with_task(task.name())
                .with_node(id as u32),
        );
        execute_boxed(sub, session.clone())
            .await
            .map_err(|e| TaskError::failed(e.as_message()))
    };

    match &result {
        Ok(()) => session.bus.publish(
            Event::new(EventKind::NodeDone)
                .with_task(task.name())
                .with_node(id as u32),
        ),
        Err(e) => session.bus.publish(
            Event::new(EventKind::NodeFailed)
                .with_task(task.name())
                .with_node(id as u32)
                .with_reason(e.as_message()),
        ),
    }
    result
}

/// Boxed indirection so the nested-graph recursion has a finite future
/// type.
fn execute_boxed(
    graph: Handle<TaskGraph>,
    session: Session,
) -> BoxFuture<'static, Result<(), GraphError>> {
    Box::pin(async move { execute(&graph, &session).await })
}

async fn acquire_slot(session: &Session) -> Result<Option<OwnedSemaphorePermit>, TaskError> {
    match &session.semaphore {
        Some(sem) => match Arc::clone(sem).acquire_owned().await {
            Ok(permit) => Ok(Some(permit)),
            Err(_) => Err(TaskError::failed("worker pool closed")),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> TaskRef) {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| {
            let sink = sink.clone();
            TaskFn::handle(name, move || {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(name);
                    Ok(())
                }
            })
        };
        (log, make)
    }

    #[tokio::test]
    async fn test_chain_runs_in_insertion_order() {
        let (log, make) = recorder();
        let mut graph = TaskGraph::new();
        let a = graph.add_task(make("a"));
        let b = graph.add_task(make("b"));
        let c = graph.add_task(make("c"));
        graph.add_dependency(b, a);
        graph.add_dependency(c, b);

        for _ in 0..3 {
            log.lock().unwrap().clear();
            assert!(execute(&graph, &Session::detached()).await.is_ok());
            assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        }
    }

    #[tokio::test]
    async fn test_failed_dependency_skips_dependents() {
        let (log, make) = recorder();
        let mut graph = TaskGraph::new();
        let a = graph.add_task(TaskFn::handle("a", || async {
            Err(TaskError::failed("boom"))
        }));
        let b = graph.add_task(make("b"));
        let c = graph.add_task(make("c"));
        graph.add_dependency(b, a);
        graph.add_dependency(c, b);

        let err = execute(&graph, &Session::detached()).await.unwrap_err();
        let GraphError::NodesFailed { failed, skipped } = err;
        assert_eq!(failed, vec!["a".to_string()]);
        assert_eq!(skipped, 2);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_independent_branch_survives_failure() {
        let (log, make) = recorder();
        let mut graph = TaskGraph::new();
        let bad = graph.add_task(TaskFn::handle("bad", || async {
            Err(TaskError::failed("boom"))
        }));
        let dependent = graph.add_task(make("dependent"));
        let _lone = graph.add_task(make("lone"));
        graph.add_dependency(dependent, bad);

        let err = execute(&graph, &Session::detached()).await.unwrap_err();
        let GraphError::NodesFailed { failed, skipped } = err;
        assert_eq!(failed, vec!["bad".to_string()]);
        assert_eq!(skipped, 1);
        assert_eq!(*log.lock().unwrap(), vec!["lone"]);
    }

    #[tokio::test]
    async fn test_empty_graph_is_a_noop() {
        let graph = TaskGraph::new();
        assert!(execute(&graph, &Session::detached()).await.is_ok());
    }

    #[tokio::test]
    async fn test_nested_graph_node() {
        let (log, make) = recorder();
        let mut inner = TaskGraph::new();
        let x = inner.add_task(make("x"));
        let y = inner.add_task(make("y"));
        inner.add_dependency(y, x);

        let mut outer = TaskGraph::new();
        let pre = outer.add_task(make("pre"));
        let sub = outer.add_task(inner.handle());
        outer.add_dependency(sub, pre);

        assert!(execute(&outer, &Session::detached()).await.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["pre", "x", "y"]);
    }

    #[tokio::test]
    async fn test_nested_graph_failure_fails_parent_node() {
        let mut inner = TaskGraph::new();
        inner.add_task(TaskFn::handle("deep", || async {
            Err(TaskError::failed("boom"))
        }));

        let mut outer = TaskGraph::new();
        outer.add_task(inner.handle());

        let err = execute(&outer, &Session::detached()).await.unwrap_err();
        let GraphError::NodesFailed { failed, .. } = err;
        assert_eq!(failed, vec!["graph".to_string()]);
    }

    #[tokio::test]
    #[should_panic(expected = "dependency cycle")]
    async fn test_cycle_panics() {
        let (_log, make) = recorder();
        let mut graph = TaskGraph::new();
        let a = graph.add_task(make("a"));
        let b = graph.add_task(make("b"));
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);

        let _ = execute(&graph, &Session::detached()).await;
    }

    #[tokio::test]
    async fn test_worker_bound_of_one_serializes() {
        let (log, make) = recorder();
        let mut graph = TaskGraph::new();
        for name in ["p0", "p1", "p2", "p3"] {
            graph.add_task(make(name));
        }
        let session = Session::new(Some(Arc::new(Semaphore::new(1))), Bus::new(1));
        assert!(execute(&graph, &session).await.is_ok());

        let mut seen = log.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec!["p0", "p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_graph_as_task_runs_detached() {
        let (log, make) = recorder();
        let mut graph = TaskGraph::new();
        graph.add_task(make("only"));
        assert!(graph.run().await.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["only"]);
    }
}
