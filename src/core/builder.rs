//! # SupervisorBuilder
//!
//! Collects configuration, subscribers and the runtime handle, then wires the
//! bus, the event listener and the exit hook in [`SupervisorBuilder::build`].

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::{
    core::{
        config::Config,
        exit::{self, ExitHook},
        listener::Listener,
        supervisor::{Shared, Supervisor},
    },
    error::ConfigError,
    events::Bus,
    subscribers::{LogWriter, Subscribe, SubscriberSet},
    tasks::{Handler, HandlerRef},
};

/// Builder for constructing a [`Supervisor`].
///
/// Defaults: [`Config::default`], built-in [`LogWriter`] enabled, exit hook
/// registered, runtime taken from the calling context.
pub struct SupervisorBuilder<A> {
    handler: HandlerRef<A>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    logging: bool,
    exit_hook: bool,
    rt: Option<Handle>,
}

impl<A: Send + 'static> SupervisorBuilder<A> {
    /// Creates a new builder bound to `handler`.
    pub fn new<H: Handler<A>>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            cfg: Config::default(),
            subscribers: Vec::new(),
            logging: true,
            exit_hook: true,
            rt: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the name attached to events and logs.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.cfg.name = name.into();
        self
    }

    /// Sets how long a worker waits for work before exiting.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.cfg.idle_timeout = idle_timeout;
        self
    }

    /// Bounds the number of pending invocations (`0` = unbounded).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.cfg.capacity = capacity;
        self
    }

    /// Adds event subscribers.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Enables or disables the built-in [`LogWriter`].
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Enables or disables registration with [`drain_all`](crate::drain_all).
    pub fn with_exit_hook(mut self, enabled: bool) -> Self {
        self.exit_hook = enabled;
        self
    }

    /// Spawns workers on `rt` instead of the runtime current at `build()`.
    ///
    /// Required when building from a thread that is not inside a runtime.
    pub fn with_runtime(mut self, rt: Handle) -> Self {
        self.rt = Some(rt);
        self
    }

    /// Validates the configuration and builds the supervisor.
    ///
    /// No worker is spawned until the first submission.
    pub fn build(self) -> Result<Supervisor<A>, ConfigError> {
        self.cfg.validate()?;
        let rt = match self.rt {
            Some(rt) => rt,
            None => Handle::try_current().map_err(|_| ConfigError::NoRuntime)?,
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let mut subscribers = self.subscribers;
        if self.logging {
            subscribers.push(Arc::new(LogWriter::new()));
        }
        let set = SubscriberSet::new(subscribers, &rt);
        let listener = (!set.is_empty()).then(|| Listener::spawn(&rt, &bus, set));

        let shared = Arc::new(Shared::new(self.cfg, self.handler, bus, rt, listener));
        if self.exit_hook {
            let hook: Arc<dyn ExitHook> = shared.clone();
            exit::register(&hook);
        }
        Ok(Supervisor::from_shared(shared))
    }
}
