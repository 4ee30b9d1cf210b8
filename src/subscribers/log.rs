//! # LogWriter: tracing sink for runtime events
//!
//! A subscriber that turns incoming [`Event`]s into `tracing` records.
//! The process decides where they go by installing a `tracing` subscriber.
//!
//! ## Levels
//! ```text
//! WorkerStarted / WorkerIdleExit / WorkerStopped  → debug
//! ShutdownRequested / ShutdownCompleted           → info
//! SubmitRejected                                  → warn
//! InvocationFailed / InvocationPanicked           → error
//! WorkerCrashed                                   → error
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let supervisor = e.supervisor.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::WorkerStarted => {
                tracing::debug!(supervisor, generation = e.generation, "worker started");
            }
            EventKind::WorkerIdleExit => {
                tracing::debug!(
                    supervisor,
                    generation = e.generation,
                    idle_ms = e.idle_ms,
                    "worker exited after idle timeout"
                );
            }
            EventKind::WorkerStopped => {
                tracing::debug!(supervisor, generation = e.generation, "worker stopped");
            }
            EventKind::WorkerCrashed => {
                tracing::error!(
                    supervisor,
                    generation = e.generation,
                    panic = reason,
                    "worker crashed; queued invocations discarded"
                );
            }
            EventKind::InvocationFailed => {
                tracing::error!(
                    supervisor,
                    generation = e.generation,
                    invocation = e.invocation,
                    error = reason,
                    "invocation failed"
                );
            }
            EventKind::InvocationPanicked => {
                tracing::error!(
                    supervisor,
                    generation = e.generation,
                    invocation = e.invocation,
                    panic = reason,
                    "invocation panicked"
                );
            }
            EventKind::SubmitRejected => {
                tracing::warn!(supervisor, reason, "submission rejected");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(supervisor, "shutdown requested");
            }
            EventKind::ShutdownCompleted => {
                tracing::info!(supervisor, "shutdown completed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
