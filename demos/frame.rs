//! A composed frame: clear → one draw per visible scene node → present.
//!
//! Run with: `cargo run --example frame`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use frameflow::{
    Context, FactoryFn, Foreach, FrameStats, Handle, NodeRef, NodeSet, ProduceError, Scheduler,
    SchedulerConfig, SceneNode, Sequence, TaskError, TaskFn,
};

struct Prop {
    name: &'static str,
    visible: bool,
}

impl SceneNode for Prop {
    fn name(&self) -> &str {
        self.name
    }
    fn is_visible(&self) -> bool {
        self.visible
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

fn pass(name: &'static str) -> frameflow::FactoryRef {
    FactoryFn::handle(move |_ctx: &Context| {
        Ok(TaskFn::handle(name, move || async move {
            println!("  running {name}");
            Ok::<_, TaskError>(())
        }))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let scene = Scene {
        props: [("crate", true), ("barrel", true), ("ghost", false)]
            .map(|(name, visible)| NodeRef::from_arc(Arc::new(Prop { name, visible })))
            .into(),
        vars: Mutex::new(HashMap::new()),
    };
    let ctx = Context::new(Handle::from_arc(Arc::new(scene)));

    let draw = FactoryFn::handle(|ctx: &Context| {
        let prop = ctx
            .scene()?
            .var("prop")
            .ok_or_else(|| ProduceError::failed("prop not bound"))?;
        let label = format!("draw:{}", prop.name());
        Ok(TaskFn::handle(label.clone(), move || {
            let label = label.clone();
            async move {
                println!("  running {label}");
                Ok::<_, TaskError>(())
            }
        }))
    });

    let frame = Sequence::new(vec![
        pass("clear"),
        Foreach::new("prop", "prop", draw)
            .culling(true)
            .parallel(true)
            .handle(),
        pass("present"),
    ])
    .handle();

    let mut cfg = SchedulerConfig::default();
    cfg.workers = 2;
    let stats = Arc::new(FrameStats::new());
    let scheduler = Scheduler::new(cfg, vec![stats.clone()]);

    for n in 0..3 {
        println!("frame {n}:");
        scheduler.run_frame(&frame, &ctx).await?;
    }
    scheduler.shutdown().await;

    let snap = stats.snapshot().await;
    println!(
        "ran {} graph(s): {} node(s) done, {} failed, {} skipped",
        snap.runs_finished, snap.nodes_done, snap.nodes_failed, snap.nodes_skipped
    );
    Ok(())
}
