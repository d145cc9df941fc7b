//! A custom subscriber next to the built-in LogWriter: watches for failed
//! nodes while a partially broken frame degrades instead of aborting.
//!
//! Run with: `cargo run --example subscriber --features logging`

use std::sync::Arc;

use async_trait::async_trait;
use frameflow::{
    Context, Event, EventKind, FactoryFn, LogWriter, ProduceError, Scheduler, SchedulerConfig,
    Sequence, Subscriber, TaskError, TaskFn,
};

struct FailureBell;

#[async_trait]
impl Subscriber for FailureBell {
    async fn on_event(&self, event: &Event) {
        if matches!(event.kind, EventKind::NodeFailed | EventKind::ChildSkipped) {
            println!(
                "!! degraded: {} ({})",
                event.task.as_deref().unwrap_or("?"),
                event.reason.as_deref().unwrap_or("?")
            );
        }
    }

    fn name(&self) -> &'static str {
        "failure-bell"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Scheduler::new(
        SchedulerConfig::default(),
        vec![Arc::new(LogWriter::new()), Arc::new(FailureBell)],
    );

    let ok = |name: &'static str| {
        FactoryFn::handle(move |_ctx: &Context| {
            Ok(TaskFn::handle(name, || async { Ok::<_, TaskError>(()) }))
        })
    };
    let unbuildable = FactoryFn::handle(|_ctx: &Context| {
        Err::<frameflow::TaskRef, _>(ProduceError::failed("shader still compiling"))
    });
    let failing = FactoryFn::handle(|_ctx: &Context| {
        Ok(TaskFn::handle("glitchy", || async {
            Err(TaskError::failed("device lost"))
        }))
    });

    // The unbuildable pass is skipped at construction time, the glitchy one
    // fails at run time; the rest of the frame still runs.
    let frame = Sequence::new(vec![ok("clear"), unbuildable, failing, ok("present")]).handle();

    match scheduler.run_frame(&frame, &Context::detached()).await {
        Ok(()) => println!("frame clean"),
        Err(err) => println!("frame degraded: {err}"),
    }

    scheduler.shutdown().await;
    Ok(())
}
