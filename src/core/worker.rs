//! # Worker: sequential executor for one supervisor.
//!
//! Drains the supervisor's queue one invocation at a time and exits on its own
//! when nothing arrives within the idle timeout.
//!
//! ## Architecture
//! ```text
//! Supervisor::submit ──► spawn Worker::run(generation, cancel)
//!
//! loop {
//!   ├─► select (biased)
//!   │     ├─ cancel          ─► run leftovers, publish WorkerStopped, exit
//!   │     └─ dequeue_wait(idle)
//!   │           ├─ Item(inv) ─► run_once() ─► Ok / TaskFailed / TaskPanicked
//!   │           └─ Idle      ─► lock slot, poll once more
//!   │                             ├─ got one ─► run it, continue
//!   │                             └─ empty   ─► Running → Idle, publish WorkerIdleExit, exit
//! }
//!
//! loop panicked ─► lock slot, discard queue, pending = 0, Running → Idle,
//!                  publish WorkerCrashed, exit
//! ```
//!
//! ## Rules
//! - Invocations run **sequentially** and in FIFO order.
//! - A failing or panicking invocation never ends the loop.
//! - Shutdown cancels only after the queue drained; the worker is never aborted.
//! - A panic in the loop itself never leaves `pending` stuck or the slot `Running`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        queue::Dequeue,
        runner::run_once,
        state::{WorkerExit, WorkerState},
        stats::Counters,
        supervisor::Shared,
    },
    error::TaskError,
    events::EventKind,
    tasks::Invocation,
};

/// One generation of background worker.
pub(crate) struct Worker<A> {
    shared: Arc<Shared<A>>,
    generation: u64,
}

impl<A: Send + 'static> Worker<A> {
    pub fn new(shared: Arc<Shared<A>>, generation: u64) -> Self {
        Self { shared, generation }
    }

    /// Runs until idle timeout or shutdown cancellation.
    pub async fn run(self, cancel: CancellationToken) -> WorkerExit {
        let outcome = AssertUnwindSafe(self.drive(&cancel)).catch_unwind().await;
        match outcome {
            Ok(exit) => exit,
            Err(payload) => {
                self.recover(TaskError::from_panic(payload));
                WorkerExit::Crashed
            }
        }
    }

    async fn drive(&self, cancel: &CancellationToken) -> WorkerExit {
        let idle = self.shared.cfg.idle_timeout;

        loop {
            let next = select! {
                biased;
                _ = cancel.cancelled() => None,
                d = self.shared.queue.dequeue_wait(idle) => Some(d),
            };

            match next {
                None => return self.stop().await,
                Some(Dequeue::Item(inv)) => self.execute(inv).await,
                Some(Dequeue::Idle) => match self.try_retire() {
                    Some(inv) => self.execute(inv).await,
                    None => {
                        self.shared.publish(
                            self.shared
                                .event(EventKind::WorkerIdleExit)
                                .with_generation(self.generation)
                                .with_idle(idle),
                        );
                        return WorkerExit::Idle;
                    }
                },
            }
        }
    }

    /// Decides, under the slot lock, whether this worker may exit.
    ///
    /// Returns an invocation that slipped in after the idle timeout fired; in
    /// that case the worker stays alive.
    fn try_retire(&self) -> Option<Invocation<A>> {
        let mut slot = self.shared.lock_slot();
        let leftover = self.shared.queue.try_dequeue();
        if leftover.is_none() && slot.state == WorkerState::Running {
            slot.state = WorkerState::Idle;
            slot.worker = None;
        }
        leftover
    }

    async fn stop(&self) -> WorkerExit {
        while let Some(inv) = self.shared.queue.try_dequeue() {
            self.execute(inv).await;
        }
        self.shared.publish(
            self.shared
                .event(EventKind::WorkerStopped)
                .with_generation(self.generation),
        );
        WorkerExit::Stopped
    }

    /// Cleans up after the loop panicked.
    ///
    /// Nothing is running and producers are locked out, so every accepted
    /// invocation still counted in `pending` is in the queue or was lost with
    /// the loop. All of them are discarded, which releases `flush` and `shutdown`.
    fn recover(&self, err: TaskError) {
        let discarded = {
            let mut slot = self.shared.lock_slot();
            let discarded = self.shared.queue.clear();
            if slot.generation == self.generation {
                slot.worker = None;
                if slot.state == WorkerState::Running {
                    slot.state = WorkerState::Idle;
                }
            }
            discarded
        };
        Counters::add(&self.shared.counters.discarded, discarded as u64);
        tracing::error!(
            supervisor = %self.shared.name,
            generation = self.generation,
            discarded,
            error = %err,
            "worker loop panicked"
        );
        self.shared.publish(
            self.shared
                .event(EventKind::WorkerCrashed)
                .with_generation(self.generation)
                .with_reason(err.as_message()),
        );
    }

    async fn execute(&self, inv: Invocation<A>) {
        let seq = inv.seq();
        tracing::trace!(
            supervisor = %self.shared.name,
            invocation = seq,
            waited_us = u64::try_from(inv.waited().as_micros()).unwrap_or(u64::MAX),
            "running invocation"
        );
        let res = run_once(self.shared.handler.as_ref(), inv.into_args()).await;

        match res {
            Ok(()) => Counters::bump(&self.shared.counters.completed),
            Err(err) => {
                Counters::bump(&self.shared.counters.failed);
                let kind = match err {
                    TaskError::Panicked { .. } => EventKind::InvocationPanicked,
                    _ => EventKind::InvocationFailed,
                };
                self.shared.publish(
                    self.shared
                        .event(kind)
                        .with_generation(self.generation)
                        .with_invocation(seq)
                        .with_reason(err.to_string()),
                );
            }
        }
        self.shared.queue.complete();
    }
}
