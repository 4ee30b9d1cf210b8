//! # TaskQueue: FIFO hand-off from producers to the worker.
//!
//! Producers on any thread append with [`TaskQueue::enqueue`]; the single live worker
//! removes with [`TaskQueue::dequeue_wait`]. A `pending` counter tracks invocations
//! that were enqueued and have not finished yet, which is what shutdown waits on.
//!
//! ## Architecture
//! ```text
//! enqueue() ──► mpsc::unbounded ──► dequeue_wait(idle) ──► worker runs handler
//!     │                                                         │
//!     └──► pending += 1                          complete() ◄───┘ pending -= 1
//!                                                     │
//!                              drain_and_wait() ◄─────┘ (wakes when pending == 0)
//! ```
//!
//! ## Rules
//! - FIFO order is preserved; each invocation is received exactly once.
//! - `enqueue` never blocks and never fails.
//! - `drain_and_wait` returns immediately when nothing is pending.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::time;

use crate::tasks::Invocation;

/// Outcome of [`TaskQueue::dequeue_wait`].
#[derive(Debug)]
pub enum Dequeue<A> {
    /// Next invocation in FIFO order.
    Item(Invocation<A>),
    /// Nothing arrived within the idle timeout.
    Idle,
}

/// Unbounded, thread-safe FIFO of pending invocations.
pub struct TaskQueue<A> {
    tx: mpsc::UnboundedSender<Invocation<A>>,
    rx: Mutex<mpsc::UnboundedReceiver<Invocation<A>>>,
    pending: watch::Sender<usize>,
    next_seq: AtomicU64,
}

impl<A: Send + 'static> TaskQueue<A> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (pending, _) = watch::channel(0);
        Self {
            tx,
            rx: Mutex::new(rx),
            pending,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Appends `args` to the tail and returns the invocation sequence number.
    pub fn enqueue(&self, args: A) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.pending.send_modify(|n| *n += 1);
        // The receiver lives inside `self`, so the channel is never closed here.
        let _ = self.tx.send(Invocation::new(seq, args));
        seq
    }

    /// Waits up to `timeout` for the next invocation.
    ///
    /// Cancel-safe: dropping the future never loses an invocation.
    pub async fn dequeue_wait(&self, timeout: Duration) -> Dequeue<A> {
        let mut rx = self.rx.lock().await;
        match time::timeout(timeout, rx.recv()).await {
            Ok(Some(inv)) => Dequeue::Item(inv),
            Ok(None) | Err(_) => Dequeue::Idle,
        }
    }

    /// Takes the next invocation if one is ready, without waiting.
    pub fn try_dequeue(&self) -> Option<Invocation<A>> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Marks one dequeued invocation as finished.
    pub fn complete(&self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Drops every queued invocation and zeroes `pending`; returns how many were dropped.
    ///
    /// Only valid while no invocation is running and no producer can enqueue,
    /// i.e. after the worker died and under the supervisor's slot lock.
    pub(crate) fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.try_dequeue().is_some() {
            dropped += 1;
        }
        self.pending.send_replace(0);
        dropped
    }

    /// Number of invocations enqueued and not yet finished (queued or running).
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Waits until the queue is empty and the last dequeued invocation finished.
    pub async fn drain_and_wait(&self) {
        let mut rx = self.pending.subscribe();
        // The sender is borrowed from `self`; it cannot be dropped while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl<A: Send + 'static> Default for TaskQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn item<A>(d: Dequeue<A>) -> Invocation<A> {
        match d {
            Dequeue::Item(inv) => inv,
            Dequeue::Idle => panic!("expected an item"),
        }
    }

    #[tokio::test]
    async fn fifo_order_and_sequence_numbers() {
        let q = TaskQueue::new();
        assert_eq!(q.enqueue("a"), 1);
        assert_eq!(q.enqueue("b"), 2);

        let first = item(q.dequeue_wait(Duration::from_millis(10)).await);
        let second = item(q.dequeue_wait(Duration::from_millis(10)).await);
        assert_eq!((first.seq(), *first.args()), (1, "a"));
        assert_eq!((second.seq(), second.into_args()), (2, "b"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_reports_idle() {
        let q: TaskQueue<u8> = TaskQueue::new();
        assert!(matches!(
            q.dequeue_wait(Duration::from_secs(1)).await,
            Dequeue::Idle
        ));
        assert!(q.try_dequeue().is_none());
    }

    #[tokio::test]
    async fn drain_on_empty_queue_returns_immediately() {
        let q: TaskQueue<u8> = TaskQueue::new();
        time::timeout(Duration::from_millis(100), q.drain_and_wait())
            .await
            .expect("drain of an empty queue must not block");
    }

    #[tokio::test]
    async fn drain_waits_for_completion_not_just_dequeue() {
        let q = Arc::new(TaskQueue::new());
        q.enqueue(1_u8);
        let _inv = q.try_dequeue().unwrap();
        assert_eq!(q.pending(), 1);

        let waiter = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.drain_and_wait().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        q.complete();
        time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("drain should finish after complete()")
            .unwrap();
        assert_eq!(q.pending(), 0);
    }

    #[tokio::test]
    async fn clear_drops_queued_work_and_releases_drain() {
        let q = Arc::new(TaskQueue::new());
        q.enqueue(1_u8);
        q.enqueue(2_u8);
        let _lost = q.try_dequeue().unwrap();

        assert_eq!(q.clear(), 1);
        assert_eq!(q.pending(), 0);
        assert!(q.try_dequeue().is_none());
        time::timeout(Duration::from_millis(100), q.drain_and_wait())
            .await
            .expect("drain must not wait after clear()");
    }
}
