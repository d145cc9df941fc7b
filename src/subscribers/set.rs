//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`](crate::events::Event) to
//! multiple subscribers **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and reported (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for
//!   that subscriber).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! Overflow and subscriber panics are reported back on the bus given to
//! [`SubscriberSet::with_reporting`] as `SubscriberOverflow` /
//! `SubscriberPanicked` events; incidents while handling one of those
//! reporting events are written to stderr instead, so a drowning
//! subscriber cannot feed itself.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};

use super::subscriber::Subscriber;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    report: Option<Bus>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscriber>>) -> Self {
        Self::build(subs, None)
    }

    /// Creates a new set that reports overflow and subscriber panics as
    /// events on the given bus.
    #[must_use]
    pub fn with_reporting(subs: Vec<Arc<dyn Subscriber>>, report: Bus) -> Self {
        Self::build(subs, Some(report))
    }

    fn build(subs: Vec<Arc<dyn Subscriber>>, report: Option<Bus>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);
            let report = report.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = format!("{panic_err:?}");
                        match &report {
                            // Incidents with reporting events themselves
                            // never generate further reports.
                            Some(bus) if !ev.is_subscriber_overflow() && !ev.is_subscriber_panic() => {
                                bus.publish(Event::subscriber_panicked(s.name(), info));
                            }
                            _ => {
                                eprintln!("[frameflow] subscriber '{}' panicked: {info}", s.name());
                            }
                        }
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            report,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and the incident is reported (see the module docs).
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.report_drop(channel.name, "full", event);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.report_drop(channel.name, "closed", event);
                }
            }
        }
    }

    fn report_drop(&self, name: &'static str, reason: &'static str, dropped: &Event) {
        match &self.report {
            Some(bus) if !dropped.is_subscriber_overflow() && !dropped.is_subscriber_panic() => {
                bus.publish(Event::subscriber_overflow(name, reason));
            }
            _ => {
                eprintln!("[frameflow] subscriber '{name}' dropped event: queue {reason}");
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Subscriber for Counter {
        async fn on_event(&self, _event: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_every_subscriber() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let set = SubscriberSet::new(vec![
            Arc::new(Counter { seen: a.clone() }),
            Arc::new(Counter { seen: b.clone() }),
        ]);
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::GraphStarted));
        set.emit(&Event::new(EventKind::GraphFinished));
        set.shutdown().await;

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    struct Panicky;

    #[async_trait]
    impl Subscriber for Panicky {
        async fn on_event(&self, _event: &Event) {
            panic!("handler bug");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn test_subscriber_panic_is_isolated_and_reported() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::with_reporting(vec![Arc::new(Panicky)], bus);

        set.emit(&Event::new(EventKind::GraphStarted));
        set.shutdown().await;

        let reported = rx.recv().await.unwrap();
        assert!(reported.is_subscriber_panic());
        assert_eq!(reported.task.as_deref(), Some("panicky"));
    }
}
