//! # SubscriberSet
//!
//! Hands every supervisor event to each subscriber without waiting for it.
//! A subscriber gets its own lane: a bounded queue drained by one task.
//!
//! ```text
//! listener ─► emit(&Event) ─┬─► lane "log"    ─► LogWriter::on_event
//!                           └─► lane "custom" ─► Custom::on_event
//! ```
//!
//! A full or closed lane drops the event for that subscriber only and logs a
//! warning. A panicking subscriber is logged and keeps receiving later events.
//! Lanes preserve event order; there is no ordering between lanes.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::error::TaskError;
use crate::events::Event;

use super::Subscribe;

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out over all subscribers of one supervisor.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    drains: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Opens one lane per subscriber; lane tasks run on `rt`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, rt: &Handle) -> Self {
        let (lanes, drains) = subs.into_iter().map(|sub| open_lane(sub, rt)).unzip();
        Self { lanes, drains }
    }

    /// Queues `event` on every lane. Never waits.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for lane in &self.lanes {
            let dropped = match lane.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "queue full",
                Err(TrySendError::Closed(_)) => "lane closed",
            };
            tracing::warn!(subscriber = lane.name, kind = ?event.kind, reason = dropped, "event dropped");
        }
    }

    /// Closes every lane and waits until queued events were delivered.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for drain in self.drains {
            let _ = drain.await;
        }
    }

    /// `true` when the set has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

fn open_lane(sub: Arc<dyn Subscribe>, rt: &Handle) -> (Lane, JoinHandle<()>) {
    let name = sub.name();
    let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

    let drain = rt.spawn(async move {
        while let Some(ev) = rx.recv().await {
            let delivery = std::panic::AssertUnwindSafe(sub.on_event(&ev)).catch_unwind();
            if let Err(payload) = delivery.await {
                let err = TaskError::from_panic(payload);
                tracing::error!(subscriber = name, kind = ?ev.kind, error = %err, "subscriber panicked");
            }
        }
    });
    (Lane { name, tx }, drain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber bug");
        }
    }

    #[tokio::test]
    async fn fans_out_in_order_and_isolates_panics() {
        let rec = Arc::new(Recorder::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Panicky), rec.clone()];
        let set = SubscriberSet::new(subs, &Handle::current());
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::WorkerStarted));
        set.emit(&Event::new(EventKind::WorkerIdleExit));
        set.shutdown().await;

        assert_eq!(
            *rec.0.lock().unwrap(),
            vec![EventKind::WorkerStarted, EventKind::WorkerIdleExit]
        );
    }
}
