//! # Handler abstractions and invocations.
//!
//! This module provides the types that flow through a supervisor:
//! - [`Handler`] - trait for the callable bound to a supervisor
//! - [`HandlerFn`], [`BlockingFn`], [`Print`] - function-backed handlers
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler<A>>`)
//! - [`Invocation`] - one captured call travelling through the queue
//! - [`Args`] - positional + named values for dynamically-shaped calls

mod args;
mod handler;
mod handler_fn;
mod invocation;

pub use args::Args;
pub use handler::{BoxHandlerFuture, Handler, HandlerRef};
pub use handler_fn::{BlockingFn, HandlerFn, Print};
pub use invocation::Invocation;
