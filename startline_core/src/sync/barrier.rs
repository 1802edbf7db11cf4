//! Startup barrier: holds workers at a common starting line until the
//! launcher decides whether they run or shut down.
//!
//! The barrier does not count its way to a release. A worker that fails to
//! bind never arrives, so waiting for N arrivals could hang forever.
//! Instead a single [`StartGuard`] resolves it after the spawn loop, and a
//! guard dropped without [`StartGuard::proceed`] resolves it to
//! [`StartSignal::Abort`].

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Final decision broadcast to every waiting worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartSignal {
    /// Run the workload
    Proceed,
    /// Return without running the workload
    Abort,
}

/// Observable barrier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierState {
    /// Not resolved yet, waiters stay parked
    Pending,
    /// Resolved, further waits return this signal immediately
    Resolved(StartSignal),
}

#[derive(Debug)]
struct Inner {
    state: BarrierState,
    arrivals: usize,
}

/// One-shot rendezvous for a launch's workers.
#[derive(Debug)]
pub struct StartupBarrier {
    expected: usize,
    inner: Mutex<Inner>,
    resolved: Condvar,
}

impl StartupBarrier {
    /// Barrier for `expected` workers.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            inner: Mutex::new(Inner {
                state: BarrierState::Pending,
                arrivals: 0,
            }),
            resolved: Condvar::new(),
        }
    }

    /// Number of workers the barrier was sized for.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of `wait` calls so far.
    pub fn arrivals(&self) -> usize {
        self.inner.lock().arrivals
    }

    /// Current state, without blocking.
    pub fn state(&self) -> BarrierState {
        self.inner.lock().state
    }

    /// Block until the barrier is resolved and return the decision.
    ///
    /// Once resolved, every call returns the same signal without blocking.
    pub fn wait(&self) -> StartSignal {
        let mut inner = self.inner.lock();
        inner.arrivals += 1;
        loop {
            if let BarrierState::Resolved(signal) = inner.state {
                return signal;
            }
            self.resolved.wait(&mut inner);
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Returns `None` if the barrier is still pending at the deadline.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<StartSignal> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        inner.arrivals += 1;
        loop {
            if let BarrierState::Resolved(signal) = inner.state {
                return Some(signal);
            }
            if self.resolved.wait_until(&mut inner, deadline).timed_out() {
                return match inner.state {
                    BarrierState::Resolved(signal) => Some(signal),
                    BarrierState::Pending => None,
                };
            }
        }
    }

    /// Take the resolution authority for this barrier.
    pub fn guard(&self) -> StartGuard<'_> {
        StartGuard {
            barrier: self,
            released: false,
        }
    }

    /// Resolve and wake every waiter. The first resolution wins; returns
    /// whether this call was it.
    fn resolve(&self, signal: StartSignal) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != BarrierState::Pending {
            return false;
        }
        inner.state = BarrierState::Resolved(signal);
        drop(inner);
        self.resolved.notify_all();
        true
    }
}

/// Resolves its barrier exactly once: [`StartSignal::Proceed`] through
/// [`proceed`](Self::proceed), [`StartSignal::Abort`] when dropped without
/// it (early return, `?`, panic).
///
/// The guard must be dropped before the workers are joined. Workers keep a
/// plain reference to the barrier, so the barrier itself outlives both.
#[must_use = "dropping the guard immediately aborts every waiting worker"]
#[derive(Debug)]
pub struct StartGuard<'b> {
    barrier: &'b StartupBarrier,
    released: bool,
}

impl StartGuard<'_> {
    /// Let every worker run.
    pub fn proceed(mut self) {
        self.released = true;
        if !self.barrier.resolve(StartSignal::Proceed) {
            log::warn!("startup barrier was already resolved before proceed");
        }
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.released && self.barrier.resolve(StartSignal::Abort) {
            log::debug!("startup barrier resolved to abort");
        }
    }
}
