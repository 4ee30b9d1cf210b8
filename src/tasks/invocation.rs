//! # Captured invocation.
//!
//! An [`Invocation`] is created by `submit`, handed to the worker through the
//! queue, consumed exactly once, then dropped. Its fields cannot be changed
//! after creation.

use std::time::{Duration, Instant};

/// One captured set of arguments destined for the bound handler.
#[derive(Debug)]
pub struct Invocation<A> {
    seq: u64,
    enqueued_at: Instant,
    args: A,
}

impl<A> Invocation<A> {
    pub(crate) fn new(seq: u64, args: A) -> Self {
        Self {
            seq,
            enqueued_at: Instant::now(),
            args,
        }
    }

    /// Sequence number within the owning supervisor (starting from 1).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Captured arguments.
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Time spent in the queue so far.
    pub fn waited(&self) -> Duration {
        self.enqueued_at.elapsed()
    }

    /// Consumes the invocation, yielding its arguments.
    pub fn into_args(self) -> A {
        self.args
    }
}
