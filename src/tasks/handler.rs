//! # The bound callable.
//!
//! A supervisor is bound to exactly one [`Handler`]. Every submitted invocation
//! is passed to [`Handler::call`], one at a time, on the background worker.
//! The common handle type is [`HandlerRef`], an `Arc<dyn Handler<A>>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::TaskError;

/// Boxed future returned by [`Handler::call`].
pub type BoxHandlerFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handler handle.
pub type HandlerRef<A> = Arc<dyn Handler<A>>;

/// # Callable executed for every invocation.
///
/// `A` is the argument type captured at submission: a tuple for positional
/// arguments, a struct for named ones, or [`Args`](crate::Args) for
/// dynamically-shaped calls.
///
/// The returned future must own everything it needs (`'static`); it runs on the
/// worker after `call` returns.
///
/// # Example
/// ```
/// use offload::{BoxHandlerFuture, Handler, TaskError};
///
/// struct Audit;
///
/// impl Handler<(String, u32)> for Audit {
///     fn call(&self, (user, code): (String, u32)) -> BoxHandlerFuture {
///         Box::pin(async move {
///             if code >= 500 {
///                 return Err(TaskError::fail(format!("{user}: server error {code}")));
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler<A>: Send + Sync + 'static {
    /// Starts one invocation.
    ///
    /// Errors and panics are caught by the worker and never stop it.
    fn call(&self, args: A) -> BoxHandlerFuture;
}

impl<A, H> Handler<A> for Arc<H>
where
    H: Handler<A> + ?Sized,
{
    fn call(&self, args: A) -> BoxHandlerFuture {
        (**self).call(args)
    }
}
