//! # offload
//!
//! **offload** runs a single handler on a background worker so producers never
//! wait for it. Submit an invocation and move on; the worker executes
//! invocations one at a time, in order, and the process drains everything that
//! was accepted before it exits.
//!
//! Typical use: logging, audit trails, metrics flushes and other fire-and-forget
//! side effects that would otherwise stall a request handler.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer A ──┐                       ┌──────────────────────────┐
//!   producer B ──┼──► Supervisor::submit │ lock slot                │
//!   producer N ──┘                       │  Idle? → spawn Worker    │
//!                                        │  enqueue(Invocation)     │
//!                                        └────────────┬─────────────┘
//!                                                     ▼
//!                                       TaskQueue (unbounded FIFO)
//!                                                     ▼
//!                                  ┌──────────────────────────────────┐
//!                                  │ Worker (one per supervisor)      │
//!                                  │  dequeue_wait(idle_timeout)      │
//!                                  │   ├─ item → handler.call(args)   │
//!                                  │   └─ idle → exit (revived later) │
//!                                  └───────────────┬──────────────────┘
//!                                                  │ publishes
//!                                                  ▼
//!                                     Bus ──► SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──submit──► Running ──idle timeout──► Idle ──submit──► Running (revival) ...
//!                     │
//!   shutdown() / drain_all():
//!     state = ShutDown → wait until queue empty and last invocation done → join worker
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / functions                   |
//! |-------------------|----------------------------------------------------------------|-----------------------------------------|
//! | **Supervision**   | Lazily started, self-terminating, revivable worker.            | [`Supervisor`], [`WorkerState`]         |
//! | **Handlers**      | Async closures, blocking closures, custom handlers.            | [`Handler`], [`HandlerFn`], [`BlockingFn`] |
//! | **Arguments**     | Typed tuples/structs, or dynamic positional + named values.    | [`Invocation`], [`Args`], [`args!`]      |
//! | **Shutdown**      | Explicit, idempotent shutdown and a process-exit drain.        | [`Supervisor::shutdown`], [`drain_all`] |
//! | **Subscriber API**| Observe worker lifecycle and invocation failures.              | [`Subscribe`], [`LogWriter`]            |
//! | **Errors**        | Typed errors for submission, execution and configuration.      | [`SubmitError`], [`TaskError`], [`ConfigError`] |
//! | **Configuration** | Idle timeout, optional bound, bus size; env overrides.         | [`Config`]                              |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use offload::{Supervisor, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let slow_log = Supervisor::blocking(|(msg, wait_ms): (String, u64)| {
//!         std::thread::sleep(Duration::from_millis(wait_ms));
//!         println!("{msg}");
//!         Ok::<(), TaskError>(())
//!     })?;
//!
//!     for i in 0..3 {
//!         println!("handling request {i}");
//!         slow_log.submit((format!("request {i} done"), 10))?;
//!     }
//!
//!     // Blocks until every accepted invocation has run.
//!     offload::drain_all().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::exit::{
    ExitHook, drain_all, drain_all_blocking, drain_on_signal, register, registered,
};
pub use core::{
    Config, Dequeue, ShutdownReport, Stats, Supervisor, SupervisorBuilder, TaskQueue, WorkerState,
};
pub use error::{ConfigError, SubmitError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{
    Args, BlockingFn, BoxHandlerFuture, Handler, HandlerFn, HandlerRef, Invocation, Print,
};
