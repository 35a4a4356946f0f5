//! Counting admission gate shared by blocking and async checkouts

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;

use crate::errors::{PoolError, PoolResult};

struct GateState {
    permits: usize,
    closed: bool,
}

/// Bounds the number of checked-out items to `capacity`.
///
/// Blocking callers park on a condition variable, async callers on a
/// [`Notify`]. Every release wakes one of each, and whoever reaches the
/// lock first takes the permit; there is no FIFO guarantee.
pub(crate) struct AdmissionGate {
    state: Mutex<GateState>,
    available: Condvar,
    notify: Notify,
    capacity: usize,
}

/// A permit that goes back to the gate when dropped unless it is forgotten.
///
/// Checkouts hold one of these while pulling or building an item, so a
/// panicking factory or a cancelled future never leaks admission.
#[must_use]
pub(crate) struct Permit<'a> {
    gate: &'a AdmissionGate,
    armed: bool,
}

impl Permit<'_> {
    /// Keep the permit consumed; the matching check-in releases it.
    pub fn forget(mut self) {
        self.armed = false;
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.gate.release();
        }
    }
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(GateState {
                permits: capacity,
                closed: false,
            }),
            available: Condvar::new(),
            notify: Notify::new(),
            capacity,
        }
    }

    fn take(state: &mut GateState) -> PoolResult<bool> {
        if state.closed {
            return Err(PoolError::Closed);
        }
        if state.permits > 0 {
            state.permits -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Take a permit if one is free right now.
    pub fn try_acquire(&self) -> PoolResult<Option<Permit<'_>>> {
        let mut state = self.state.lock();
        Ok(Self::take(&mut state)?.then(|| self.permit()))
    }

    /// Block the calling thread until a permit is free or the gate closes.
    pub fn acquire(&self) -> PoolResult<Permit<'_>> {
        let mut state = self.state.lock();
        loop {
            if Self::take(&mut state)? {
                return Ok(self.permit());
            }
            self.available.wait(&mut state);
        }
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<Permit<'_>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.acquire();
        };
        let mut state = self.state.lock();
        loop {
            if Self::take(&mut state)? {
                return Ok(self.permit());
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return match Self::take(&mut state)? {
                    true => Ok(self.permit()),
                    false => Err(PoolError::Timeout(timeout)),
                };
            }
        }
    }

    /// Suspend the calling task until a permit is free or the gate closes.
    ///
    /// Dropping the future before it resolves leaves the permit count
    /// untouched.
    pub async fn acquire_async(&self) -> PoolResult<Permit<'_>> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a release between the check and
            // the await is not missed.
            notified.as_mut().enable();

            let taken = Self::take(&mut self.state.lock())?;
            if taken {
                return Ok(self.permit());
            }
            notified.await;
        }
    }

    /// Hand one permit back. A no-op once the gate is closed.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        if state.permits >= self.capacity {
            tracing::warn!(
                capacity = self.capacity,
                "permit released with no matching checkout, ignoring"
            );
            return;
        }
        state.permits += 1;
        drop(state);

        self.available.notify_one();
        self.notify.notify_one();
    }

    /// Invalidate the gate. Current and future waiters fail with
    /// [`PoolError::Closed`]. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        drop(state);

        self.available.notify_all();
        self.notify.notify_waiters();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn available_permits(&self) -> usize {
        self.state.lock().permits
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn permit(&self) -> Permit<'_> {
        Permit {
            gate: self,
            armed: true,
        }
    }
}
