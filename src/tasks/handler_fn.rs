//! # Function-backed handlers
//!
//! - [`HandlerFn`] wraps an async closure `F: Fn(A) -> Fut`, producing a fresh
//!   future per invocation.
//! - [`BlockingFn`] wraps a synchronous closure and runs it on tokio's blocking pool,
//!   so sleeping or doing blocking I/O does not stall the runtime.
//! - [`Print`] prints the `Debug` form of each invocation; it is the default
//!   handler behind [`Supervisor::print`](crate::Supervisor::print).
//!
//! ## Example
//! ```rust
//! use offload::{BlockingFn, HandlerFn, HandlerRef, TaskError};
//!
//! let write: HandlerRef<String> = HandlerFn::arc(|line: String| async move {
//!     if line.is_empty() {
//!         return Err(TaskError::fail("empty line"));
//!     }
//!     Ok::<(), TaskError>(())
//! });
//!
//! let slow: HandlerRef<(String, u64)> = BlockingFn::arc(|(msg, ms): (String, u64)| {
//!     std::thread::sleep(std::time::Duration::from_millis(ms));
//!     println!("{msg}");
//!     Ok::<(), TaskError>(())
//! });
//! # let _ = (write, slow);
//! ```

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::handler::{BoxHandlerFuture, Handler};

/// Async function-backed handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<A, F, Fut> Handler<A> for HandlerFn<F>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn call(&self, args: A) -> BoxHandlerFuture {
        Box::pin((self.f)(args))
    }
}

/// Synchronous function-backed handler, executed via `spawn_blocking`.
///
/// A panic inside the closure surfaces as [`TaskError::Panicked`].
#[derive(Debug)]
pub struct BlockingFn<F> {
    f: Arc<F>,
}

impl<F> BlockingFn<F> {
    /// Creates a new blocking handler.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<A, F> Handler<A> for BlockingFn<F>
where
    A: Send + 'static,
    F: Fn(A) -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn call(&self, args: A) -> BoxHandlerFuture {
        let f = Arc::clone(&self.f);
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || f(args)).await {
                Ok(res) => res,
                Err(join) if join.is_panic() => Err(TaskError::from_panic(join.into_panic())),
                Err(join) => Err(TaskError::fail(join)),
            }
        })
    }
}

/// Prints each invocation's `Debug` form to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Print;

impl<A> Handler<A> for Print
where
    A: Debug + Send + 'static,
{
    fn call(&self, args: A) -> BoxHandlerFuture {
        Box::pin(async move {
            println!("{args:?}");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn handler_fn_produces_fresh_future_per_call() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let h = HandlerFn::new(move |n: u32| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(n);
                Ok::<(), TaskError>(())
            }
        });

        h.call(1).await.unwrap();
        h.call(2).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn blocking_fn_reports_errors_and_panics() {
        let h = BlockingFn::new(|n: i32| {
            if n < 0 {
                panic!("negative input");
            }
            if n == 0 {
                return Err(TaskError::fail("zero"));
            }
            Ok(())
        });

        assert!(h.call(1).await.is_ok());

        let err = h.call(0).await.unwrap_err();
        assert_eq!(err.as_label(), "task_failed");

        let err = h.call(-1).await.unwrap_err();
        assert!(matches!(err, TaskError::Panicked { ref info } if info == "negative input"));
    }
}
