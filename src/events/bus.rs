//! # Bus
//!
//! Per-supervisor broadcast channel. `submit`, the worker and `shutdown`
//! publish; the listener task is the only receiver.
//!
//! ```text
//! submit()   ─┐
//! worker     ─┼─► Bus ─► listener ─► SubscriberSet
//! shutdown() ─┘
//! ```
//!
//! Publishing never waits. Without a receiver (no subscribers, or after the
//! listener closed) events are discarded. A receiver that falls behind by more
//! than the capacity loses the oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast sender for [`Event`]s. Clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding up to `capacity` undelivered events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        // Err only means nobody is listening.
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
