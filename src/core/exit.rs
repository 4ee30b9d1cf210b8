//! # Process-exit hooks.
//!
//! A tokio runtime drops its unfinished tasks when `main` returns, which would
//! silently lose queued invocations. Every supervisor therefore registers itself
//! here at construction (unless built with `with_exit_hook(false)`), and the
//! process drains them on its way out:
//!
//! ```text
//! #[tokio::main]
//! async fn main() {
//!     ... submit work ...
//!     offload::drain_all().await;        // normal end of main
//! }
//!
//! offload::drain_on_signal().await?;     // or: wait for SIGINT/SIGTERM, then drain
//! ```
//!
//! Forgetting the call does not silently lose work on a multi-thread runtime:
//! dropping the last [`Supervisor`](crate::Supervisor) handle with invocations
//! pending drains them in place. On a current-thread runtime, or outside any
//! runtime, the drop can only log a warning with the pending count.
//!
//! ## Rules
//! - Entries are weak: a supervisor whose handles and worker are gone is skipped.
//! - Draining an already shut-down supervisor is a no-op, so an explicit
//!   `shutdown()` followed by `drain_all()` is safe.
//! - Hooks are drained concurrently.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures::future::{BoxFuture, join_all};

use crate::core::supervisor::ShutdownReport;

/// Something that can be drained when the process exits.
///
/// Implemented by every supervisor; custom components can register too.
pub trait ExitHook: Send + Sync + 'static {
    /// Stops accepting work and waits for accepted work to finish.
    fn drain(self: Arc<Self>) -> BoxFuture<'static, ShutdownReport>;
}

static HOOKS: Mutex<Vec<Weak<dyn ExitHook>>> = Mutex::new(Vec::new());

/// Registers `hook` to be drained by [`drain_all`]. Only a weak reference is kept.
pub fn register(hook: &Arc<dyn ExitHook>) {
    let mut hooks = HOOKS.lock().unwrap_or_else(PoisonError::into_inner);
    hooks.retain(|h| h.strong_count() > 0);
    hooks.push(Arc::downgrade(hook));
}

/// Number of registered hooks that are still alive.
pub fn registered() -> usize {
    let hooks = HOOKS.lock().unwrap_or_else(PoisonError::into_inner);
    hooks.iter().filter(|h| h.strong_count() > 0).count()
}

/// Drains every live registered hook and returns their reports.
pub async fn drain_all() -> Vec<ShutdownReport> {
    let live: Vec<Arc<dyn ExitHook>> = {
        let mut hooks = HOOKS.lock().unwrap_or_else(PoisonError::into_inner);
        hooks.retain(|h| h.strong_count() > 0);
        hooks.iter().filter_map(Weak::upgrade).collect()
    };
    tracing::debug!(hooks = live.len(), "draining exit hooks");
    join_all(live.into_iter().map(|hook| hook.drain())).await
}

/// [`drain_all`] for synchronous code.
///
/// Must be called from outside the runtime that runs the workers.
pub fn drain_all_blocking() -> Vec<ShutdownReport> {
    futures::executor::block_on(drain_all())
}

/// Waits for a termination signal, then runs [`drain_all`].
///
/// Returns `Err` if signal registration fails.
pub async fn drain_on_signal() -> std::io::Result<Vec<ShutdownReport>> {
    wait_for_shutdown_signal().await?;
    Ok(drain_all().await)
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => tracing::info!("received SIGINT, draining"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM, draining"),
        _ = sigquit.recv() => tracing::info!("received SIGQUIT, draining"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("received Ctrl-C, draining");
    Ok(())
}
