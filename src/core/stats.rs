//! # Counters.
//!
//! Every supervisor keeps lock-free counters; [`Stats`] is a point-in-time copy.
//! `failed` is the error counter for invocations that returned an error or panicked.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a supervisor's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Invocations accepted by `submit`.
    pub submitted: u64,
    /// Invocations whose handler returned `Ok`.
    pub completed: u64,
    /// Invocations whose handler returned an error or panicked.
    pub failed: u64,
    /// Submissions rejected (after shutdown or queue full).
    pub rejected: u64,
    /// Accepted invocations dropped because their worker crashed.
    pub discarded: u64,
    /// Workers spawned, including the first one.
    pub workers_spawned: u64,
    /// Invocations queued or running at the time of the snapshot.
    pub pending: usize,
}

impl Stats {
    /// Workers spawned after the first one, i.e. revivals after an idle exit.
    pub fn revivals(&self) -> u64 {
        self.workers_spawned.saturating_sub(1)
    }

    /// Invocations that ran to an outcome, successful or not.
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub rejected: AtomicU64,
    pub discarded: AtomicU64,
    pub workers_spawned: AtomicU64,
}

impl Counters {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, pending: usize) -> Stats {
        Stats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
            pending,
        }
    }
}
