//! # Supervisor configuration.
//!
//! Provides [`Config`] centralized settings for one [`Supervisor`](crate::Supervisor).
//!
//! ## Sentinel values
//! - `capacity = 0` → unbounded queue (default)
//! - `width` is reserved for pooling; only `1` is accepted today
//!
//! ## Environment
//! [`Config::from_env`] starts from [`Config::default`] and overrides:
//! - `OFFLOAD_IDLE_TIMEOUT_MS` → `idle_timeout`
//! - `OFFLOAD_CAPACITY` → `capacity`
//! - `OFFLOAD_BUS_CAPACITY` → `bus_capacity`

use std::borrow::Cow;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for a single supervisor.
///
/// ## Field semantics
/// - `name`: label attached to every event (`supervisor=` in logs)
/// - `idle_timeout`: how long a worker waits for work before exiting
/// - `width`: number of workers (reserved; must be `1`)
/// - `capacity`: max pending invocations (`0` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Name used in events and logs.
    pub name: Cow<'static, str>,

    /// Idle period after which the worker exits on its own.
    ///
    /// The next submission revives a fresh worker.
    pub idle_timeout: Duration,

    /// Number of concurrent workers. Reserved for pooling; must be `1`.
    pub width: usize,

    /// Maximum number of pending (queued or running) invocations.
    ///
    /// - `0` = unbounded: submissions never fail for capacity reasons,
    ///   memory grows with the backlog
    /// - `n > 0` = `submit` returns `SubmitError::QueueFull` once `n` are pending
    pub capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the queue bound as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` pending invocations
    #[inline]
    pub fn capacity_limit(&self) -> Option<usize> {
        if self.capacity == 0 {
            None
        } else {
            Some(self.capacity)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the invariants `build()` relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::ZeroIdleTimeout {
                idle_timeout: self.idle_timeout,
            });
        }
        if self.width != 1 {
            return Err(ConfigError::UnsupportedWidth { width: self.width });
        }
        Ok(())
    }

    /// Loads defaults overridden by `OFFLOAD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(ms) = parse_var(&lookup, "OFFLOAD_IDLE_TIMEOUT_MS")? {
            cfg.idle_timeout = Duration::from_millis(ms);
        }
        if let Some(cap) = parse_var(&lookup, "OFFLOAD_CAPACITY")? {
            cfg.capacity = cap;
        }
        if let Some(cap) = parse_var(&lookup, "OFFLOAD_BUS_CAPACITY")? {
            cfg.bus_capacity = cap;
        }
        Ok(cfg)
    }
}

/// Parses `var` into the field's own type, so out-of-range values are errors.
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "offload"`
    /// - `idle_timeout = 2s`
    /// - `width = 1`
    /// - `capacity = 0` (unbounded)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("offload"),
            idle_timeout: Duration::from_secs(2),
            width: 1,
            capacity: 0,
            bus_capacity: 1024,
        }
    }
}
