//! # Supervisor: fire-and-forget front end for one handler.
//!
//! The [`Supervisor`] owns the queue, the bound handler, the idle timeout and the
//! liveness slot. Producers call [`Supervisor::submit`]; the supervisor makes
//! sure a worker is alive, enqueues, and returns without waiting for the handler.
//!
//! ## Key responsibilities
//! - lazily spawn the worker on the first submission
//! - revive it after it exited on idle timeout
//! - reject submissions after shutdown (or when a bounded queue is full)
//! - on shutdown, wait until every accepted invocation finished, then join the worker
//!
//! ## High-level architecture
//! ```text
//! submit(args):
//!   lock slot
//!     ├─ ShutDown            ─► Err(ShutDown), publish SubmitRejected
//!     ├─ bounded and full    ─► Err(QueueFull), publish SubmitRejected
//!     ├─ Idle                ─► generation += 1, spawn Worker, state = Running
//!     └─ queue.enqueue(args)
//!   unlock
//!
//! shutdown():
//!   state = ShutDown
//!   first call: publish ShutdownRequested, spawn close task:
//!       queue.drain_and_wait()
//!       cancel + join worker (if any)
//!       publish ShutdownCompleted, close event listener
//!       closed = true
//!   every call: wait for closed
//!
//! last Supervisor handle dropped with work pending:
//!   multi-thread runtime ─► block_in_place(shutdown)
//!   otherwise            ─► tracing::warn!(pending)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use offload::{HandlerFn, Supervisor, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let log = Supervisor::builder(HandlerFn::arc(|(name, code): (String, u16)| async move {
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!         println!("{name} -> {code}");
//!         Ok::<(), TaskError>(())
//!     }))
//!     .with_idle_timeout(Duration::from_millis(200))
//!     .build()?;
//!
//!     log.submit(("index".to_string(), 200))?;
//!     log.submit(("missing".to_string(), 404))?;
//!
//!     let report = log.shutdown().await;
//!     assert_eq!(report.stats.completed, 2);
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::SupervisorBuilder,
        config::Config,
        exit::ExitHook,
        listener::Listener,
        queue::TaskQueue,
        state::{Slot, WorkerHandle, WorkerState},
        stats::{Counters, Stats},
        worker::Worker,
    },
    error::{ConfigError, SubmitError, TaskError},
    events::{Bus, Event, EventKind},
    tasks::{BlockingFn, Handler, HandlerRef, Print},
};

/// Result of a [`Supervisor::shutdown`] call.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Name of the supervisor.
    pub supervisor: Arc<str>,
    /// `true` if an earlier call had already started shutdown.
    pub already_shut_down: bool,
    /// Counters after every accepted invocation finished.
    pub stats: Stats,
}

/// State shared between the supervisor handles and the live worker.
pub(crate) struct Shared<A> {
    pub cfg: Config,
    pub name: Arc<str>,
    pub handler: HandlerRef<A>,
    pub queue: TaskQueue<A>,
    pub counters: Counters,
    bus: Bus,
    rt: Handle,
    slot: Mutex<Slot>,
    listener: Mutex<Option<Listener>>,
    closed: watch::Sender<bool>,
}

impl<A: Send + 'static> Shared<A> {
    pub fn new(
        cfg: Config,
        handler: HandlerRef<A>,
        bus: Bus,
        rt: Handle,
        listener: Option<Listener>,
    ) -> Self {
        Self {
            name: Arc::from(cfg.name.as_ref()),
            cfg,
            handler,
            queue: TaskQueue::new(),
            counters: Counters::default(),
            bus,
            rt,
            slot: Mutex::new(Slot::new()),
            listener: Mutex::new(listener),
            closed: watch::Sender::new(false),
        }
    }

    /// Locks the liveness slot. Critical sections never panic, so poisoning is ignored.
    pub fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// New event tagged with this supervisor's name.
    pub fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_supervisor(Arc::clone(&self.name))
    }

    pub fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    pub fn stats(&self) -> Stats {
        self.counters.snapshot(self.queue.pending())
    }

    fn submit(self: &Arc<Self>, args: A) -> Result<(), SubmitError> {
        let mut slot = self.lock_slot();
        if let Err(err) = self.admit(&slot) {
            drop(slot);
            Counters::bump(&self.counters.rejected);
            self.publish(
                self.event(EventKind::SubmitRejected)
                    .with_reason(err.as_label()),
            );
            return Err(err);
        }
        if slot.state == WorkerState::Idle {
            self.spawn_worker(&mut slot);
        }
        self.queue.enqueue(args);
        Counters::bump(&self.counters.submitted);
        Ok(())
    }

    fn admit(&self, slot: &Slot) -> Result<(), SubmitError> {
        if slot.state == WorkerState::ShutDown {
            return Err(SubmitError::ShutDown);
        }
        if let Some(capacity) = self.cfg.capacity_limit() {
            if self.queue.pending() >= capacity {
                return Err(SubmitError::QueueFull { capacity });
            }
        }
        Ok(())
    }

    /// Spawns the next worker generation. Caller holds the slot lock.
    fn spawn_worker(self: &Arc<Self>, slot: &mut Slot) {
        slot.generation += 1;
        let generation = slot.generation;
        let cancel = CancellationToken::new();
        let worker = Worker::new(Arc::clone(self), generation);
        let join = self.rt.spawn(worker.run(cancel.clone()));

        slot.worker = Some(WorkerHandle { join, cancel });
        slot.state = WorkerState::Running;
        Counters::bump(&self.counters.workers_spawned);
        self.publish(
            self.event(EventKind::WorkerStarted)
                .with_generation(generation),
        );
    }

    /// Marks `ShutDown` and waits until the close sequence has finished.
    ///
    /// The sequence runs as its own task, so a caller that stops waiting does
    /// not leave later callers hanging.
    async fn shutdown(self: &Arc<Self>) -> ShutdownReport {
        let first = {
            let mut slot = self.lock_slot();
            let first = slot.state != WorkerState::ShutDown;
            slot.state = WorkerState::ShutDown;
            first
        };
        if first {
            self.publish(self.event(EventKind::ShutdownRequested));
            self.rt.spawn(Arc::clone(self).close());
        }

        let mut closed = self.closed.subscribe();
        // The sender lives in `self`, so this only returns once `closed` is set.
        let _ = closed.wait_for(|done| *done).await;

        ShutdownReport {
            supervisor: Arc::clone(&self.name),
            already_shut_down: !first,
            stats: self.stats(),
        }
    }

    async fn close(self: Arc<Self>) {
        self.queue.drain_and_wait().await;

        let worker = self.lock_slot().worker.take();
        if let Some(worker) = worker {
            worker.cancel.cancel();
            match worker.join.await {
                Ok(exit) => {
                    tracing::debug!(supervisor = %self.name, ?exit, "worker joined");
                }
                Err(err) => {
                    tracing::error!(supervisor = %self.name, error = %err, "worker ended abnormally");
                }
            }
        }

        self.publish(self.event(EventKind::ShutdownCompleted));
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            listener.close().await;
        }
        self.closed.send_replace(true);
    }

    /// Runs when the last user handle goes away.
    ///
    /// After this point nobody can call `shutdown`, and a runtime that stops
    /// would drop the queued invocations.
    fn on_last_handle_dropped(self: &Arc<Self>) {
        if self.lock_slot().state == WorkerState::ShutDown {
            return;
        }
        let pending = self.queue.pending();
        if pending == 0 {
            return;
        }
        match Handle::try_current() {
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tracing::debug!(supervisor = %self.name, pending, "last handle dropped, draining");
                tokio::task::block_in_place(|| current.block_on(self.shutdown()));
            }
            _ => {
                tracing::warn!(
                    supervisor = %self.name,
                    pending,
                    "last handle dropped with pending invocations; \
                     call shutdown() or offload::drain_all() before the runtime stops"
                );
            }
        }
    }
}

impl<A: Send + 'static> ExitHook for Shared<A> {
    fn drain(self: Arc<Self>) -> BoxFuture<'static, ShutdownReport> {
        Box::pin(async move { self.shutdown().await })
    }
}

/// Owned only by [`Supervisor`] handles, never by the worker or the exit
/// registry, so it drops exactly when the last user handle does.
struct LastHandle<A: Send + 'static> {
    shared: Arc<Shared<A>>,
}

impl<A: Send + 'static> Drop for LastHandle<A> {
    fn drop(&mut self) {
        self.shared.on_last_handle_dropped();
    }
}

/// Fire-and-forget front end for one handler, backed by a lazily revived worker.
///
/// Cheap to clone; all clones share the same queue and worker. When the last
/// clone is dropped with invocations still pending, it drains them first on a
/// multi-thread runtime, and logs a warning otherwise.
pub struct Supervisor<A: Send + 'static> {
    shared: Arc<Shared<A>>,
    _last: Arc<LastHandle<A>>,
}

impl<A: Send + 'static> Clone for Supervisor<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _last: Arc::clone(&self._last),
        }
    }
}

impl<A: Send + 'static> Supervisor<A> {
    /// Starts a builder bound to `handler` with [`Config::default`].
    ///
    /// Accepts any [`Handler`], including a shared [`HandlerRef`].
    pub fn builder<H: Handler<A>>(handler: H) -> SupervisorBuilder<A> {
        SupervisorBuilder::new(handler)
    }

    /// Builds a supervisor with default settings.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new<H: Handler<A>>(handler: H) -> Result<Self, ConfigError> {
        Self::builder(handler).build()
    }

    /// Builds a supervisor around a synchronous closure (run via `spawn_blocking`).
    pub fn blocking<F>(f: F) -> Result<Self, ConfigError>
    where
        F: Fn(A) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Self::new(BlockingFn::new(f))
    }

    pub(crate) fn from_shared(shared: Arc<Shared<A>>) -> Self {
        let last = Arc::new(LastHandle {
            shared: Arc::clone(&shared),
        });
        Self {
            shared,
            _last: last,
        }
    }

    /// Queues one invocation and returns immediately.
    ///
    /// Spawns a worker first if none is alive. Never waits for the handler.
    ///
    /// # Errors
    /// - [`SubmitError::ShutDown`] after [`shutdown`](Self::shutdown) started.
    /// - [`SubmitError::QueueFull`] when `Config::capacity` is set and reached.
    pub fn submit(&self, args: A) -> Result<(), SubmitError> {
        self.shared.submit(args)
    }

    /// Returns a closure that stands in for the bound handler.
    ///
    /// Calling it submits. Rejections are counted in [`Stats::rejected`]. They
    /// reach subscribers as `SubmitRejected` only while the event listener is
    /// still open, which means never after shutdown (`QueueFull` rejections
    /// before shutdown are delivered).
    pub fn proxy(&self) -> impl Fn(A) + Clone + Send + Sync + 'static {
        let this = self.clone();
        move |args| {
            let _ = this.submit(args);
        }
    }

    /// Waits until every invocation submitted so far has finished.
    ///
    /// The supervisor stays usable. If other producers keep submitting,
    /// this waits for their invocations too.
    pub async fn flush(&self) {
        self.shared.queue.drain_and_wait().await;
    }

    /// Stops accepting submissions, waits for every accepted invocation to
    /// finish, then joins the worker.
    ///
    /// Idempotent: later (or concurrent) calls wait until the first call's
    /// sequence has fully finished, worker joined included, and return a report
    /// with `already_shut_down = true`. Calling it before the first submission
    /// returns immediately. Dropping the returned future does not abort the
    /// shutdown.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.shared.shutdown().await
    }

    /// [`shutdown`](Self::shutdown) for synchronous code.
    ///
    /// Must be called from outside the runtime (for example at the end of a
    /// plain `fn main` or from a non-runtime thread); the runtime that owns
    /// the worker has to keep running while this blocks.
    pub fn shutdown_blocking(&self) -> ShutdownReport {
        futures::executor::block_on(self.shared.shutdown())
    }

    /// Current liveness state.
    pub fn state(&self) -> WorkerState {
        self.shared.lock_slot().state
    }

    /// Point-in-time counters.
    pub fn stats(&self) -> Stats {
        self.shared.stats()
    }

    /// Name used in events and logs.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configuration this supervisor was built with.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }
}

impl<A: Debug + Send + 'static> Supervisor<A> {
    /// Supervisor bound to [`Print`], the default pass-through handler.
    pub fn print() -> Result<Self, ConfigError> {
        Self::new(Print)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use crate::{
        subscribers::Subscribe,
        tasks::{Args, HandlerFn},
    };

    fn quiet<A: Send + 'static>(builder: SupervisorBuilder<A>) -> SupervisorBuilder<A> {
        builder.with_logging(false).with_exit_hook(false)
    }

    /// Handler that appends each argument to a shared list.
    fn recorder<A: Send + 'static>() -> (Arc<std::sync::Mutex<Vec<A>>>, HandlerRef<A>) {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: HandlerRef<A> = HandlerFn::arc(move |args: A| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(args);
                Ok::<(), TaskError>(())
            }
        });
        (seen, handler)
    }

    async fn wait_for_state<A: Send + 'static>(sup: &Supervisor<A>, want: WorkerState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sup.state() != want {
            assert!(Instant::now() < deadline, "state never became {want:?}");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submit_returns_before_slow_handler_runs() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sup = quiet(Supervisor::builder(BlockingFn::new(
            move |(msg, wait_ms): (String, u64)| {
                std::thread::sleep(Duration::from_millis(wait_ms));
                sink.lock().unwrap().push((msg, 3));
                Ok::<(), TaskError>(())
            },
        )))
        .build()
        .unwrap();

        let started = Instant::now();
        sup.submit(("hello".to_string(), 50)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(seen.lock().unwrap().is_empty());

        let report = sup.shutdown().await;
        assert!(!report.already_shut_down);
        assert_eq!(report.stats.completed, 1);
        assert_eq!(*seen.lock().unwrap(), vec![("hello".to_string(), 3)]);
    }

    #[tokio::test]
    async fn invocations_run_in_submission_order() {
        let (seen, handler) = recorder::<u32>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();

        for i in 0..100 {
            sup.submit(i).unwrap();
        }
        let report = sup.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
        assert_eq!(report.stats.submitted, 100);
        assert_eq!(report.stats.completed, 100);
        assert_eq!(report.stats.workers_spawned, 1);
        assert_eq!(report.stats.pending, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn idle_worker_exits_and_is_revived() {
        let (seen, handler) = recorder::<&'static str>();
        let sup = quiet(Supervisor::builder(handler))
            .with_idle_timeout(Duration::from_millis(30))
            .build()
            .unwrap();
        assert_eq!(sup.state(), WorkerState::Idle);

        sup.submit("first").unwrap();
        assert_eq!(sup.state(), WorkerState::Running);
        wait_for_state(&sup, WorkerState::Idle).await;

        sup.submit("second").unwrap();
        let report = sup.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(report.stats.workers_spawned, 2);
        assert_eq!(report.stats.revivals(), 1);
    }

    #[tokio::test]
    async fn failures_and_panics_do_not_stop_the_worker() {
        let (seen, _) = recorder::<u32>();
        let sink = Arc::clone(&seen);
        let handler = HandlerFn::arc(move |n: u32| {
            let sink = Arc::clone(&sink);
            async move {
                if n == 4 {
                    panic!("boom at {n}");
                }
                if n % 3 == 0 {
                    return Err(TaskError::fail(format!("rejected {n}")));
                }
                sink.lock().unwrap().push(n);
                Ok(())
            }
        });
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();

        for n in 0..7 {
            sup.submit(n).unwrap();
        }
        let report = sup.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 5]);
        assert_eq!(report.stats.failed, 4);
        assert_eq!(report.stats.completed, 3);
        assert_eq!(report.stats.workers_spawned, 1);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (seen, handler) = recorder::<u8>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();
        sup.submit(1).unwrap();

        let first = sup.shutdown().await;
        let second = sup.shutdown().await;

        assert!(!first.already_shut_down);
        assert!(second.already_shut_down);
        assert_eq!(second.stats.completed, 1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(sup.state(), WorkerState::ShutDown);
    }

    #[tokio::test]
    async fn shutdown_before_first_submit_returns_immediately() {
        let (_, handler) = recorder::<u8>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();

        let report = tokio::time::timeout(Duration::from_secs(1), sup.shutdown())
            .await
            .expect("shutdown of an unused supervisor must not block");

        assert_eq!(report.stats.workers_spawned, 0);
        assert_eq!(report.stats.submitted, 0);
        assert_eq!(sup.state(), WorkerState::ShutDown);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let (seen, handler) = recorder::<u8>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();
        sup.shutdown().await;

        assert_eq!(sup.submit(9), Err(SubmitError::ShutDown));
        assert_eq!(sup.stats().rejected, 1);
        assert_eq!(sup.stats().workers_spawned, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bounded_queue_rejects_when_full() {
        let gate = Arc::new(Semaphore::new(0));
        let permits = Arc::clone(&gate);
        let handler = HandlerFn::arc(move |_: u8| {
            let permits = Arc::clone(&permits);
            async move {
                permits.acquire().await.unwrap().forget();
                Ok::<(), TaskError>(())
            }
        });
        let sup = quiet(Supervisor::builder(handler))
            .with_capacity(2)
            .build()
            .unwrap();

        sup.submit(1).unwrap();
        sup.submit(2).unwrap();
        assert_eq!(sup.submit(3), Err(SubmitError::QueueFull { capacity: 2 }));

        gate.add_permits(2);
        let report = sup.shutdown().await;
        assert_eq!(report.stats.completed, 2);
        assert_eq!(report.stats.rejected, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_never_lose_work_or_overlap() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 50;

        let active = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let handler = {
            let (active, overlaps, seen) =
                (Arc::clone(&active), Arc::clone(&overlaps), Arc::clone(&seen));
            BlockingFn::new(move |item: (usize, usize)| {
                if active.fetch_add(1, Ordering::SeqCst) != 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                seen.lock().unwrap().push(item);
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), TaskError>(())
            })
        };
        let sup = quiet(Supervisor::builder(handler))
            .with_idle_timeout(Duration::from_millis(2))
            .with_runtime(Handle::current())
            .build()
            .unwrap();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let sup = sup.clone();
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        sup.submit((p, i)).unwrap();
                        if i % 10 == 9 {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let report = sup.shutdown().await;
        let seen = seen.lock().unwrap();

        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        assert_eq!(report.stats.completed, (PRODUCERS * PER_PRODUCER) as u64);
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        for p in 0..PRODUCERS {
            let mine: Vec<usize> = seen.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
            assert_eq!(mine, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn flush_waits_but_keeps_accepting() {
        let (seen, handler) = recorder::<u8>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();

        for i in 0..10 {
            sup.submit(i).unwrap();
        }
        sup.flush().await;
        assert_eq!(seen.lock().unwrap().len(), 10);
        assert_eq!(sup.stats().pending, 0);
        assert_ne!(sup.state(), WorkerState::ShutDown);

        sup.submit(10).unwrap();
        sup.shutdown().await;
        assert_eq!(seen.lock().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn proxy_submits_and_counts_rejections() {
        let (seen, handler) = recorder::<u8>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();
        let log = sup.proxy();

        log(1);
        log(2);
        sup.shutdown().await;
        log(3);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(sup.stats().rejected, 1);
    }

    #[tokio::test]
    async fn dynamic_args_reach_the_handler() {
        let (seen, handler) = recorder::<Args>();
        let sup = quiet(Supervisor::builder(handler)).build().unwrap();

        sup.submit(crate::args!("hello", 3; wait = 0.02)).unwrap();
        sup.shutdown().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].to_string(), r#"("hello", 3, wait=0.02)"#);
    }

    #[derive(Default)]
    struct Kinds(std::sync::Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Kinds {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
    }

    #[tokio::test]
    async fn subscribers_see_lifecycle_and_failures() {
        let kinds = Arc::new(Kinds::default());
        let handler = HandlerFn::arc(|n: u8| async move {
            if n == 0 {
                return Err(TaskError::fail("zero"));
            }
            Ok(())
        });
        let sup = quiet(Supervisor::builder(handler))
            .with_name("audit")
            .with_subscriber(kinds.clone())
            .build()
            .unwrap();

        sup.submit(0).unwrap();
        sup.submit(1).unwrap();
        sup.shutdown().await;
        let _ = sup.submit(2);

        let kinds = kinds.0.lock().unwrap();
        assert_eq!(kinds.first(), Some(&EventKind::WorkerStarted));
        assert!(kinds.contains(&EventKind::InvocationFailed));
        assert!(kinds.contains(&EventKind::ShutdownRequested));
        assert!(kinds.contains(&EventKind::WorkerStopped));
        assert_eq!(kinds.last(), Some(&EventKind::ShutdownCompleted));
        assert!(!kinds.contains(&EventKind::SubmitRejected));
    }

    #[test]
    fn build_outside_runtime_fails() {
        let (_, handler) = recorder::<u8>();
        let err = quiet(Supervisor::builder(handler)).build().err().unwrap();
        assert!(matches!(err, ConfigError::NoRuntime));
    }

    #[test]
    fn shutdown_blocking_from_plain_thread() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let (seen, handler) = recorder::<u8>();
        let sup = quiet(Supervisor::builder(handler))
            .with_runtime(rt.handle().clone())
            .build()
            .unwrap();

        sup.submit(7).unwrap();
        let report = sup.shutdown_blocking();

        assert_eq!(report.stats.completed, 1);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    /// Handler that sleeps `ms` and counts finished invocations.
    fn counting(done: &Arc<AtomicUsize>, ms: u64) -> HandlerRef<u8> {
        let done = Arc::clone(done);
        HandlerFn::arc(move |_: u8| {
            let done = Arc::clone(&done);
            async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok::<(), TaskError>(())
            }
        })
    }

    #[test]
    fn dropping_last_handle_drains_before_runtime_stops() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        rt.block_on(async {
            let sup = quiet(Supervisor::builder(counting(&done, 20)))
                .build()
                .unwrap();
            let producer = sup.clone();
            for i in 0..5 {
                producer.submit(i).unwrap();
            }
            drop(producer);
            // `sup` is the last handle and goes out of scope with work queued.
        });
        drop(rt);

        assert_eq!(done.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn dropping_last_handle_on_current_thread_does_not_block() {
        let done = Arc::new(AtomicUsize::new(0));
        let sup = quiet(Supervisor::builder(counting(&done, 20)))
            .build()
            .unwrap();
        sup.submit(1).unwrap();

        let started = Instant::now();
        drop(sup);
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn crashed_worker_releases_pending_and_is_revivable() {
        // No timer driver: the worker loop panics on its first idle wait.
        let no_timer = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let (seen, handler) = recorder::<u8>();
        let events = Arc::new(Kinds::default());
        let sup = quiet(Supervisor::builder(handler))
            .with_runtime(no_timer.handle().clone())
            .with_subscriber(events.clone())
            .build()
            .unwrap();

        sup.submit(1).unwrap();
        wait_for_state(&sup, WorkerState::Idle).await;
        let stats = sup.stats();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.discarded, 1);

        sup.submit(2).unwrap();
        wait_for_state(&sup, WorkerState::Idle).await;
        assert_eq!(sup.stats().workers_spawned, 2);

        let report = tokio::time::timeout(Duration::from_secs(2), sup.shutdown())
            .await
            .expect("shutdown must not hang after a worker crash");
        assert_eq!(report.stats.discarded, 2);
        assert!(seen.lock().unwrap().is_empty());
        assert!(events.0.lock().unwrap().contains(&EventKind::WorkerCrashed));

        no_timer.shutdown_background();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_shutdowns_all_wait_for_the_join() {
        let done = Arc::new(AtomicUsize::new(0));
        let events = Arc::new(Kinds::default());
        let sup = quiet(Supervisor::builder(counting(&done, 30)))
            .with_subscriber(events.clone())
            .build()
            .unwrap();
        for i in 0..3 {
            sup.submit(i).unwrap();
        }

        // The first caller gives up early; the close sequence keeps running.
        let abandoned = tokio::time::timeout(Duration::from_millis(1), sup.shutdown()).await;
        assert!(abandoned.is_err());

        let (a, b) = tokio::join!(sup.shutdown(), sup.shutdown());
        assert!(a.already_shut_down && b.already_shut_down);
        for report in [&a, &b] {
            assert_eq!(report.stats.completed, 3);
            assert_eq!(report.stats.pending, 0);
        }
        // Completion is signalled only after the listener delivered everything.
        assert_eq!(
            events.0.lock().unwrap().last(),
            Some(&EventKind::ShutdownCompleted)
        );
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
