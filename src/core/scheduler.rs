//! # Scheduler: the per-frame entry point.
//!
//! The [`Scheduler`] owns the event bus, a [`SubscriberSet`], the
//! worker-pool bound, and the two ways work enters the system: a produced
//! task graph ([`Scheduler::run_graph`]) or a root factory invoked once
//! per frame ([`Scheduler::run_frame`]).
//!
//! ## High-level architecture
//! ```text
//! Inputs, once per frame:
//!   root FactoryRef + Context ──► run_frame()
//!        │
//!        ├─ ctx.with_bus(bus)           composers report skipped children
//!        ├─ root.produce(ctx)?          recursive factory expansion
//!        │     Sequence / Foreach / leaves fold children into a TaskGraph
//!        └─ run produced task:
//!              graph → graph runner (worker-bounded, dependency-ordered)
//!              single leaf → one worker unit
//!
//! Event flow:
//!   composers/runner ── publish(Event) ──► Bus ──► scheduler listener
//!                                                      │
//!                                                SubscriberSet::emit
//!                                           ┌─────────┼─────────┐
//!                                           ▼         ▼         ▼
//!                                      [queue S1] [queue S2] [queue SN]
//!                                        worker     worker     worker
//!                                      on_event() on_event() on_event()
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use frameflow::{
//!     Context, FactoryFn, FrameStats, Scheduler, SchedulerConfig, Sequence, TaskError, TaskFn,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = SchedulerConfig::default();
//!     cfg.workers = 2;
//!
//!     let stats = Arc::new(FrameStats::new());
//!     let scheduler = Scheduler::new(cfg, vec![stats.clone()]);
//!
//!     let step = |name: &'static str| {
//!         FactoryFn::handle(move |_ctx: &Context| {
//!             Ok(TaskFn::handle(name, || async { Ok::<_, TaskError>(()) }))
//!         })
//!     };
//!     let root = Sequence::new(vec![step("cull"), step("draw"), step("present")]).handle();
//!
//!     scheduler.run_frame(&root, &Context::detached()).await?;
//!     scheduler.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinHandle;

use crate::context::Context;
use crate::core::config::SchedulerConfig;
use crate::error::{GraphError, SchedulerError};
use crate::events::Bus;
use crate::graph::{runner, TaskGraph};
use crate::subscribers::{Subscriber, SubscriberSet};
use crate::tasks::{FactoryRef, TaskFactory, TaskRef};

/// Coordinates factory expansion, graph execution, and event delivery.
///
/// Create one per application (or per independent render loop) from within
/// a tokio runtime; the constructor spawns the bus listener.
pub struct Scheduler {
    cfg: SchedulerConfig,
    bus: Bus,
    semaphore: Option<Arc<Semaphore>>,
    subs: Arc<SubscriberSet>,
    listener: JoinHandle<()>,
}

impl Scheduler {
    /// Creates a new scheduler with the given config and subscribers.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(cfg: SchedulerConfig, subscribers: Vec<Arc<dyn Subscriber>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::with_reporting(subscribers, bus.clone()));
        let semaphore = match cfg.workers {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        let listener = Self::subscriber_listener(&bus, &subs);
        Self {
            cfg,
            bus,
            semaphore,
            subs,
            listener,
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn subscriber_listener(bus: &Bus, subs: &Arc<SubscriberSet>) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = Arc::clone(subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    // A lagged listener skips the missed events and keeps
                    // going; subscribers see a gap, not a stop.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        })
    }

    /// The scheduler's configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.cfg
    }

    /// The event bus lifecycle events are published on.
    ///
    /// Useful for ad-hoc `subscribe()` calls in tests and tools; durable
    /// consumers belong in the subscriber set passed to [`Scheduler::new`].
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs one frame: produce a task from the root factory, then execute
    /// it.
    ///
    /// The context is re-issued with this scheduler's bus so composers can
    /// report skipped children. A construction error from the *root* has
    /// no enclosing composer to absorb it and surfaces as
    /// [`SchedulerError::Produce`]; failures inside the produced graph
    /// surface as [`SchedulerError::Graph`].
    pub async fn run_frame(&self, root: &FactoryRef, ctx: &Context) -> Result<(), SchedulerError> {
        let ctx = ctx.with_bus(self.bus.clone());
        let task = root.produce(&ctx)?;
        runner::run_task(&task, &self.session()).await?;
        Ok(())
    }

    /// Runs an already produced task: a graph goes through the graph
    /// runner, a single leaf runs as one worker unit.
    pub async fn run_task(&self, task: &TaskRef) -> Result<(), GraphError> {
        runner::run_task(task, &self.session()).await
    }

    /// Executes a task graph to completion on this scheduler's worker pool.
    pub async fn run_graph(&self, graph: &TaskGraph) -> Result<(), GraphError> {
        runner::execute(graph, &self.session()).await
    }

    /// Drains and joins the subscriber workers.
    ///
    /// Pending events already on the bus are delivered first. Call after
    /// the last frame; running frames concurrently with shutdown loses
    /// their events.
    pub async fn shutdown(self) {
        let Self {
            bus,
            subs,
            listener,
            ..
        } = self;
        drop(bus);
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(subs) {
            set.shutdown().await;
        }
    }

    fn session(&self) -> runner::Session {
        runner::Session::new(self.semaphore.clone(), self.bus.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Sequence;
    use crate::error::{ProduceError, TaskError};
    use crate::events::EventKind;
    use crate::subscribers::FrameStats;
    use crate::tasks::{FactoryFn, TaskFn};
    use std::time::Duration;

    fn step(name: &'static str) -> FactoryRef {
        FactoryFn::handle(move |_ctx: &Context| {
            Ok(TaskFn::handle(name, || async { Ok::<_, TaskError>(()) }))
        })
    }

    #[tokio::test]
    async fn test_run_frame_produces_and_executes() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), Vec::new());
        let mut rx = scheduler.bus().subscribe();

        let root = Sequence::new(vec![step("cull"), step("draw")]).handle();
        scheduler
            .run_frame(&root, &Context::detached())
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(kinds.first(), Some(&EventKind::GraphStarted));
        assert_eq!(kinds.last(), Some(&EventKind::GraphFinished));
        assert_eq!(
            kinds
                .iter()
                .filter(|k| matches!(k, EventKind::NodeDone))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_root_produce_error_surfaces() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), Vec::new());
        let root = FactoryFn::handle(|_ctx: &Context| {
            Err::<TaskRef, _>(ProduceError::failed("no scene"))
        });

        let err = scheduler
            .run_frame(&root, &Context::detached())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Produce(_)));
    }

    #[tokio::test]
    async fn test_single_task_root_is_run_directly() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), Vec::new());
        let root = Sequence::new(vec![step("only")]).handle();
        scheduler
            .run_frame(&root, &Context::detached())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_node_reports_frame_failure() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), Vec::new());
        let broken = FactoryFn::handle(|_ctx: &Context| {
            Ok(TaskFn::handle("broken", || async {
                Err(TaskError::failed("boom"))
            }))
        });
        let root = Sequence::new(vec![step("a"), broken]).handle();

        let err = scheduler
            .run_frame(&root, &Context::detached())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Graph(_)));
    }

    #[tokio::test]
    async fn test_frame_with_serial_loop_runs_in_enumeration_order() {
        use crate::compose::Foreach;
        use crate::context::{NodeRef, NodeSet, SceneNode};
        use crate::handle::Handle;
        use std::collections::HashMap;
        use std::sync::Mutex;

        struct Prop(&'static str);
        impl SceneNode for Prop {
            fn name(&self) -> &str {
                self.0
            }
            fn is_visible(&self) -> bool {
                true
            }
        }

        struct Scene {
            props: Vec<NodeRef>,
            vars: Mutex<HashMap<String, NodeRef>>,
        }
        impl NodeSet for Scene {
            fn nodes(&self, flag: &str) -> Vec<NodeRef> {
                if flag == "prop" {
                    self.props.clone()
                } else {
                    Vec::new()
                }
            }
            fn set_var(&self, name: &str, node: NodeRef) {
                self.vars.lock().unwrap().insert(name.to_string(), node);
            }
            fn var(&self, name: &str) -> Option<NodeRef> {
                self.vars.lock().unwrap().get(name).cloned()
            }
        }

        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let draw = FactoryFn::handle(move |ctx: &Context| {
            let prop = ctx
                .scene()?
                .var("prop")
                .ok_or_else(|| ProduceError::failed("prop not bound"))?;
            let label = format!("draw:{}", prop.name());
            let sink = sink.clone();
            Ok(TaskFn::handle(label.clone(), move || {
                let sink = sink.clone();
                let label = label.clone();
                async move {
                    sink.lock().unwrap().push(label);
                    Ok(())
                }
            }))
        });
        let sink = log.clone();
        let clear = FactoryFn::handle(move |_ctx: &Context| {
            let sink = sink.clone();
            Ok(TaskFn::handle("clear", move || {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push("clear".to_string());
                    Ok(())
                }
            }))
        });

        let scene = Scene {
            props: ["a", "b", "c"]
                .map(|n| NodeRef::from_arc(Arc::new(Prop(n))))
                .into(),
            vars: Mutex::new(HashMap::new()),
        };
        let ctx = Context::new(Handle::from_arc(Arc::new(scene)));

        let root = Sequence::new(vec![
            clear,
            Foreach::new("prop", "prop", draw).handle(),
        ])
        .handle();

        let scheduler = Scheduler::new(SchedulerConfig::default(), Vec::new());
        scheduler.run_frame(&root, &ctx).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["clear", "draw:a", "draw:b", "draw:c"]
        );
    }

    #[tokio::test]
    async fn test_stats_observe_a_frame() {
        let stats = Arc::new(FrameStats::new());
        let scheduler = Scheduler::new(SchedulerConfig::default(), vec![stats.clone()]);

        let root = Sequence::new(vec![step("a"), step("b"), step("c")]).handle();
        scheduler
            .run_frame(&root, &Context::detached())
            .await
            .unwrap();

        // Event delivery is asynchronous; wait for the terminal event.
        let mut snap = stats.snapshot().await;
        for _ in 0..100 {
            if snap.runs_finished >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            snap = stats.snapshot().await;
        }
        assert_eq!(snap.runs_started, 1);
        assert_eq!(snap.runs_finished, 1);
        assert_eq!(snap.nodes_done, 3);
        assert_eq!(snap.nodes_failed, 0);

        scheduler.shutdown().await;
    }
}
