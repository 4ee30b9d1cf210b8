//! # Events
//!
//! What a supervisor reports about itself. Three groups of [`EventKind`]:
//! worker lifecycle (`Worker*`), invocation outcomes (`Invocation*`,
//! `SubmitRejected`) and shutdown progress (`Shutdown*`).
//!
//! `seq` is process-wide and strictly increasing, so events from several
//! supervisors can be merged into one ordered stream.
//!
//! ```rust
//! use offload::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InvocationFailed)
//!     .with_supervisor("audit-log")
//!     .with_invocation(7)
//!     .with_reason("disk full");
//!
//! assert!(ev.is_failure());
//! assert_eq!(ev.supervisor.as_deref(), Some("audit-log"));
//! assert_eq!(ev.invocation, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Kind of supervisor event.
///
/// | Kind                 | `generation` | `invocation` | `idle_ms` | `reason`        |
/// |----------------------|:------------:|:------------:|:---------:|-----------------|
/// | `WorkerStarted`      | yes          |              |           |                 |
/// | `WorkerIdleExit`     | yes          |              | yes       |                 |
/// | `WorkerStopped`      | yes          |              |           |                 |
/// | `WorkerCrashed`      | yes          |              |           | panic message   |
/// | `InvocationFailed`   | yes          | yes          |           | error message   |
/// | `InvocationPanicked` | yes          | yes          |           | panic message   |
/// | `SubmitRejected`     |              |              |           | rejection label |
/// | `ShutdownRequested`  |              |              |           |                 |
/// | `ShutdownCompleted`  |              |              |           |                 |
///
/// `supervisor` is set on every event a supervisor publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A worker was spawned, either the first one or a revival.
    WorkerStarted,
    /// A worker saw no work for the idle timeout and exited.
    WorkerIdleExit,
    /// Shutdown stopped the worker after the queue drained.
    WorkerStopped,
    /// The worker loop panicked outside any handler (for example a runtime
    /// without a timer). Queued invocations were discarded; the next
    /// submission spawns a fresh worker.
    WorkerCrashed,

    /// The handler returned an error; the worker carries on.
    InvocationFailed,
    /// The handler panicked; the panic was caught and the worker carries on.
    InvocationPanicked,
    SubmitRejected,

    /// First `shutdown()` call; submissions are refused from here on.
    ShutdownRequested,
    /// All accepted invocations finished and the worker was joined.
    ShutdownCompleted,
}

/// One supervisor event. Optional fields depend on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,

    pub supervisor: Option<Arc<str>>,
    /// Worker generation, 1 for the first worker.
    pub generation: Option<u64>,
    /// Sequence number of the invocation within its supervisor.
    pub invocation: Option<u64>,
    /// Idle timeout in milliseconds, saturating at `u32::MAX`.
    pub idle_ms: Option<u32>,
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a new event with the next sequence number and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            supervisor: None,
            generation: None,
            invocation: None,
            idle_ms: None,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_supervisor(mut self, name: impl Into<Arc<str>>) -> Self {
        self.supervisor = Some(name.into());
        self
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_invocation(mut self, seq: u64) -> Self {
        self.invocation = Some(seq);
        self
    }

    pub fn with_idle(mut self, d: Duration) -> Self {
        self.idle_ms = Some(u32::try_from(d.as_millis()).unwrap_or(u32::MAX));
        self
    }

    /// `true` for a failed or panicked invocation.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::InvocationFailed | EventKind::InvocationPanicked
        )
    }
}
