//! # Event subscribers for the offload runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   worker ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                        │
//!                                              ┌─────────┼─────────┐
//!                                              ▼         ▼         ▼
//!                                          LogWriter  Metrics   Custom
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
