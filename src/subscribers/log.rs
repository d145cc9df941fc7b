//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [graph-started] nodes=4
//! [node-started] task=draw node=1
//! [node-done] task=draw node=1
//! [node-failed] task=post node=2 err="missing uniform"
//! [node-skipped] task=present node=3
//! [child-skipped] composer=foreach index=1 err="mesh not resident"
//! [graph-finished] nodes=4 failed=1 skipped=1
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::subscriber::Subscriber;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscriber`] for
/// structured logging or metrics collection.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self
    }
}

fn opt(field: &Option<std::sync::Arc<str>>) -> &str {
    field.as_deref().unwrap_or("?")
}

#[async_trait]
impl Subscriber for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::GraphStarted => {
                println!("[graph-started] nodes={}", e.nodes.unwrap_or(0));
            }
            EventKind::GraphFinished => {
                println!(
                    "[graph-finished] nodes={} failed={} skipped={}",
                    e.nodes.unwrap_or(0),
                    e.failed.unwrap_or(0),
                    e.skipped.unwrap_or(0)
                );
            }
            EventKind::NodeStarted => match e.node {
                Some(node) => println!("[node-started] task={} node={node}", opt(&e.task)),
                None => println!("[node-started] task={}", opt(&e.task)),
            },
            EventKind::NodeDone => match e.node {
                Some(node) => println!("[node-done] task={} node={node}", opt(&e.task)),
                None => println!("[node-done] task={}", opt(&e.task)),
            },
            EventKind::NodeFailed => {
                println!(
                    "[node-failed] task={} node={:?} err={:?}",
                    opt(&e.task),
                    e.node,
                    opt(&e.reason)
                );
            }
            EventKind::NodeSkipped => {
                println!("[node-skipped] task={} node={:?}", opt(&e.task), e.node);
            }
            EventKind::ChildSkipped => {
                println!(
                    "[child-skipped] composer={} index={:?} err={:?}",
                    opt(&e.task),
                    e.node,
                    opt(&e.reason)
                );
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={} reason={:?}",
                    opt(&e.task),
                    opt(&e.reason)
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={:?}",
                    opt(&e.task),
                    opt(&e.reason)
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
