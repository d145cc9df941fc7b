//! # frameflow
//!
//! **frameflow** is a per-frame task-graph kernel for real-time rendering
//! loops. Frame work (culling, drawing, state changes) is not a fixed call
//! sequence but a DAG of tasks assembled anew every frame from declarative
//! composition primitives, then executed with bounded concurrency.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Sequence   │   │   Foreach    │   │  leaf factory│
//!     │ (ordered     │   │ (per visible │   │ (collaborator│
//!     │  pipeline)   │   │  scene node) │   │  supplied)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │    produce(Context), once per frame │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskGraph (DAG of TaskRef nodes + dependency edges)              │
//! │  - single-child composers return the child's task directly        │
//! │  - a child construction error skips only that child               │
//! │  - empty child graphs never break the dependency chain            │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (worker-bounded runner + event bus)                    │
//! │  - Pending → Ready → Running → Done | Failed; dependents of a     │
//! │    failed node are Skipped, independent branches keep running     │
//! │  - Bus → SubscriberSet → FrameStats / LogWriter / custom          │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Ownership
//! Every shared object travels in a [`Handle`]: cloning is an atomic
//! acquire, dropping is an atomic release, the target's `Drop` runs
//! exactly once, and dereferencing a null handle panics instead of
//! limping on. Handles held in `static` storage go into a [`StaticSlot`],
//! and one [`registry::teardown`] pass at process exit erases them all,
//! idempotently, in registration order.
//!
//! ### Error handling
//! Three classes, three behaviors (see [`error`](crate::ProduceError)):
//! construction errors are absorbed by the enclosing composer (the frame
//! degrades, it is not lost); execution errors become the run's summary
//! result ([`GraphError`]); ownership-contract violations panic.
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                    |
//! |-------------------|----------------------------------------------------------------|---------------------------------------|
//! | **Composition**   | Declarative frame description expanded per frame.              | [`Sequence`], [`Foreach`], [`TaskFactory`] |
//! | **Execution**     | Dependency-ordered DAG run with a bounded worker pool.         | [`TaskGraph`], [`Scheduler`]          |
//! | **Ownership**     | Counted handles and ordered static teardown.                   | [`Handle`], [`StaticSlot`]            |
//! | **Observability** | Run-lifecycle events fanned out to subscribers.                | [`Event`], [`Subscriber`], [`FrameStats`] |
//! | **Errors**        | Typed construction/execution errors; panicking contracts.      | [`ProduceError`], [`TaskError`], [`GraphError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use frameflow::{
//!     Context, FactoryFn, Foreach, Handle, NodeRef, NodeSet, ProduceError, Scheduler,
//!     SchedulerConfig, SceneNode, Sequence, TaskError, TaskFn,
//! };
//!
//! // A toy scene: the real one is an external collaborator.
//! struct Ball(&'static str);
//! impl SceneNode for Ball {
//!     fn name(&self) -> &str { self.0 }
//!     fn is_visible(&self) -> bool { true }
//! }
//!
//! struct Scene {
//!     balls: Vec<NodeRef>,
//!     vars: std::sync::Mutex<std::collections::HashMap<String, NodeRef>>,
//! }
//! impl NodeSet for Scene {
//!     fn nodes(&self, flag: &str) -> Vec<NodeRef> {
//!         if flag == "ball" { self.balls.clone() } else { Vec::new() }
//!     }
//!     fn set_var(&self, name: &str, node: NodeRef) {
//!         self.vars.lock().unwrap().insert(name.to_string(), node);
//!     }
//!     fn var(&self, name: &str) -> Option<NodeRef> {
//!         self.vars.lock().unwrap().get(name).cloned()
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scene = Scene {
//!         balls: ["red", "green", "blue"]
//!             .map(|n| NodeRef::from_arc(Arc::new(Ball(n))))
//!             .into(),
//!         vars: Default::default(),
//!     };
//!     let ctx = Context::new(Handle::from_arc(Arc::new(scene)));
//!
//!     // One draw call per visible ball, iterations free to run in
//!     // parallel, between a clear and a present.
//!     let draw = FactoryFn::handle(|ctx: &Context| {
//!         let ball = ctx.scene()?.var("ball").ok_or_else(|| ProduceError::failed("ball not bound"))?;
//!         let label = format!("draw:{}", ball.name());
//!         Ok(TaskFn::handle(label, || async { Ok::<_, TaskError>(()) }))
//!     });
//!     let clear = FactoryFn::handle(|_: &Context| {
//!         Ok(TaskFn::handle("clear", || async { Ok::<_, TaskError>(()) }))
//!     });
//!     let present = FactoryFn::handle(|_: &Context| {
//!         Ok(TaskFn::handle("present", || async { Ok::<_, TaskError>(()) }))
//!     });
//!     let frame = Sequence::new(vec![
//!         clear,
//!         Foreach::new("ball", "ball", draw).culling(true).parallel(true).handle(),
//!         present,
//!     ])
//!     .handle();
//!
//!     let mut cfg = SchedulerConfig::default();
//!     cfg.workers = 2;
//!     let scheduler = Scheduler::new(cfg, Vec::new());
//!
//!     scheduler.run_frame(&frame, &ctx).await?;
//!     scheduler.shutdown().await;
//!     Ok(())
//! }
//! ```

mod compose;
mod context;
mod core;
mod error;
mod events;
mod graph;
mod handle;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use compose::{Foreach, Sequence};
pub use context::{Context, NodeRef, NodeSet, SceneNode};
pub use crate::core::{Scheduler, SchedulerConfig};
pub use error::{GraphError, ProduceError, SchedulerError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use graph::{NodeId, TaskGraph};
pub use handle::{registry, AsAnyArc, Handle, StaticSlot};
pub use subscribers::{FrameSnapshot, FrameStats, Subscriber, SubscriberSet};
pub use tasks::{FactoryFn, FactoryRef, Task, TaskFactory, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
