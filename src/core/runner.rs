//! # Run a single invocation.
//!
//! Calls the handler once and folds both ways a handler can go wrong into a
//! [`TaskError`]:
//!
//! ```text
//! handler.call(args) ──► Ok(())            → Ok(())
//!                    ──► Err(e)            → Err(e)
//!                    ──► panic (building)  → Err(Panicked)
//!                    ──► panic (polling)   → Err(Panicked)
//! ```
//!
//! ## Rules
//! - A panic never escapes into the worker loop.
//! - No retries: each invocation runs exactly once.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{error::TaskError, tasks::Handler};

/// Executes `handler` once with `args`, catching panics.
pub async fn run_once<A: 'static>(handler: &dyn Handler<A>, args: A) -> Result<(), TaskError> {
    let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(args))) {
        Ok(fut) => fut,
        Err(panic) => return Err(TaskError::from_panic(panic)),
    };

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(TaskError::from_panic(panic)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{BoxHandlerFuture, HandlerFn};

    struct PanicsEagerly;

    impl Handler<()> for PanicsEagerly {
        fn call(&self, _args: ()) -> BoxHandlerFuture {
            panic!("before the future exists");
        }
    }

    #[tokio::test]
    async fn eager_panic_is_caught() {
        let err = run_once(&PanicsEagerly, ()).await.unwrap_err();
        assert!(matches!(err, TaskError::Panicked { ref info } if info.contains("before")));
    }

    #[tokio::test]
    async fn panic_while_polling_is_caught() {
        let h = HandlerFn::new(|n: u8| async move {
            tokio::task::yield_now().await;
            if n > 1 {
                panic!("too big: {n}");
            }
            Ok::<(), TaskError>(())
        });

        assert!(run_once::<u8>(&h, 1).await.is_ok());
        let err = run_once::<u8>(&h, 2).await.unwrap_err();
        assert_eq!(err.as_message(), "panic: too big: 2");
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let h = HandlerFn::new(|_: ()| async { Err::<(), _>(TaskError::fail("nope")) });
        let err = run_once(&h, ()).await.unwrap_err();
        assert_eq!(err.to_string(), "execution failed: nope");
    }
}
