//! Runtime core: queue, worker lifecycle and shutdown.
//!
//! The public API from this module is [`Supervisor`] (with its builder, config,
//! state and stats) and the process-exit functions in [`exit`].
//!
//! Internal modules:
//! - [`queue`]: FIFO hand-off with idle-timeout dequeue and drain-wait;
//! - [`runner`]: runs one invocation, catching errors and panics;
//! - [`worker`]: dequeue/execute loop that exits on idle timeout;
//! - [`state`]: liveness state guarded by the supervisor's mutex;
//! - [`listener`]: forwards bus events to subscribers;
//! - [`supervisor`]: submission, revival and shutdown;
//! - [`exit`]: process-exit hook registry and signal handling.

mod builder;
mod config;
pub mod exit;
mod listener;
mod queue;
mod runner;
mod state;
mod stats;
mod supervisor;
mod worker;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use queue::{Dequeue, TaskQueue};
pub use state::WorkerState;
pub use stats::Stats;
pub use supervisor::{ShutdownReport, Supervisor};
