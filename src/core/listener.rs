//! # Event listener: Bus → SubscriberSet.
//!
//! One listener task per supervisor with subscribers. It forwards every bus
//! event to the [`SubscriberSet`] and, when closed during shutdown, delivers
//! what is still buffered before shutting the set down.

use tokio::{
    runtime::Handle,
    select,
    sync::broadcast::{
        Receiver,
        error::{RecvError, TryRecvError},
    },
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    events::{Bus, Event},
    subscribers::SubscriberSet,
};

/// Handle to a running listener task.
pub(crate) struct Listener {
    join: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Listener {
    /// Subscribes to `bus` and spawns the forwarding task on `rt`.
    pub fn spawn(rt: &Handle, bus: &Bus, set: SubscriberSet) -> Self {
        let rx = bus.subscribe();
        let cancel = CancellationToken::new();
        let join = rt.spawn(forward(rx, set, cancel.clone()));
        Self { join, cancel }
    }

    /// Delivers buffered events, then waits for subscribers to finish.
    pub async fn close(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}

async fn forward(mut rx: Receiver<Event>, set: SubscriberSet, cancel: CancellationToken) {
    loop {
        select! {
            biased;
            res = rx.recv() => match res {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = cancel.cancelled() => {
                loop {
                    match rx.try_recv() {
                        Ok(ev) => set.emit(&ev),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                break;
            }
        }
    }
    set.shutdown().await;
}
