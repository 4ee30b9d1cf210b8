//! # Worker liveness.
//!
//! [`WorkerState`] replaces ad hoc "is the thread alive" checks. It lives in a
//! [`Slot`] together with the current worker handle, behind one mutex owned by
//! the supervisor.
//!
//! ## Transitions
//! ```text
//! Idle ──submit()──► Running ──idle timeout / crash──► Idle
//!   │                   │
//!   └────shutdown()─────┴──────────────────► ShutDown (terminal)
//! ```
//!
//! ## Rules
//! - `submit` checks and revives under the lock, then enqueues under the same lock.
//! - The worker decides to exit under the lock, after one last non-waiting poll.
//!
//! Together these rule out a queued invocation with no worker left to run it.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Liveness of a supervisor's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No worker alive; the next submission spawns one.
    Idle,
    /// A worker is alive and draining the queue.
    Running,
    /// Shutdown was requested; submissions are rejected.
    ShutDown,
}

/// Why a worker returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// No invocation arrived within the idle timeout.
    Idle,
    /// Shutdown cancelled the worker after the queue drained.
    Stopped,
    /// The worker loop itself panicked; queued invocations were discarded.
    Crashed,
}

/// Handle to the live worker.
pub(crate) struct WorkerHandle {
    pub join: JoinHandle<WorkerExit>,
    pub cancel: CancellationToken,
}

/// Mutex-guarded liveness record.
pub(crate) struct Slot {
    pub state: WorkerState,
    pub worker: Option<WorkerHandle>,
    /// Number of workers spawned so far; the live one has this generation.
    pub generation: u64,
}

impl Slot {
    pub fn new() -> Self {
        Self {
            state: WorkerState::Idle,
            worker: None,
            generation: 0,
        }
    }
}
