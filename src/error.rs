//! Error types used by the offload runtime and handlers.
//!
//! This module defines three error enums:
//!
//! - [`SubmitError`]: a submission was not admitted to the queue.
//! - [`TaskError`]: a single invocation of the bound handler failed.
//! - [`ConfigError`]: a supervisor could not be built from its configuration.
//!
//! All of them provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced when submitting an invocation.
///
/// The default (unbounded) supervisor only ever rejects after shutdown.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The supervisor was shut down; no further invocations are accepted.
    #[error("supervisor is shut down")]
    ShutDown,

    /// A bounded queue reached its capacity.
    #[error("queue full (capacity {capacity})")]
    QueueFull {
        /// Configured capacity of the queue.
        capacity: usize,
    },
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use offload::SubmitError;
    ///
    /// assert_eq!(SubmitError::ShutDown.as_label(), "submit_shut_down");
    /// assert_eq!(SubmitError::QueueFull { capacity: 8 }.as_label(), "submit_queue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::ShutDown => "submit_shut_down",
            SubmitError::QueueFull { .. } => "submit_queue_full",
        }
    }
}

/// # Errors produced by a single invocation.
///
/// Neither variant stops the worker: the failure is counted, published as an
/// event and the next invocation runs.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The handler returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked; the panic was caught by the worker.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl ToString) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use offload::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Builds a [`TaskError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked { info }
    }
}

/// # Errors produced while building a supervisor.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A worker with a zero idle timeout would exit before it could dequeue anything.
    #[error("idle timeout must be greater than zero (got {idle_timeout:?})")]
    ZeroIdleTimeout {
        /// The rejected value.
        idle_timeout: Duration,
    },

    /// Only a single worker per supervisor is supported.
    #[error("unsupported worker width {width}; only 1 is supported")]
    UnsupportedWidth {
        /// The rejected value.
        width: usize,
    },

    /// `build()` was called outside a tokio runtime and no handle was supplied.
    #[error("no tokio runtime available; build inside a runtime or pass a handle")]
    NoRuntime,

    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroIdleTimeout { .. } => "config_zero_idle_timeout",
            ConfigError::UnsupportedWidth { .. } => "config_unsupported_width",
            ConfigError::NoRuntime => "config_no_runtime",
            ConfigError::InvalidEnv { .. } => "config_invalid_env",
        }
    }
}
