// ABOUTME: Resource ring for all-or-nothing pair acquisition across agents.
// ABOUTME: One mutex guards availability; one condvar per resource wakes waiters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::snapshot::RingSnapshot;
use crate::error::RingError;
use crate::event::{RingEvent, RingObserver};

/// Mutable state for the ring, protected by a single mutex.
struct RingState {
    /// `true` when resource `i` is free.
    available: Vec<bool>,
    /// `true` when agent `i` holds both of its resources.
    holding: Vec<bool>,
    closed: bool,
}

impl RingState {
    fn pair_free(&self, right: usize, left: usize) -> bool {
        self.available[right] && self.available[left]
    }
}

/// A ring of N resources shared by N agents.
///
/// Agent `i` needs resource `i` (its right) and resource `(i + 1) % N` (its
/// left) at the same time. Both are taken in a single step under the ring
/// lock, so no agent ever sits on one resource while blocking for the other
/// and the circular wait behind the classic deadlock cannot form.
///
/// # Lock Semantics
///
/// - **All-or-nothing acquire:** `acquire_pair()` returns only once both
///   resources were free at the same instant, and marks them held together.
/// - **Recheck on wake:** every wake-up re-evaluates the full pair predicate;
///   a neighbor may have reclaimed the other resource in the meantime.
/// - **Broadcast release:** `release_pair()` wakes every waiter on both
///   resources, since different neighbors may be queued on each.
/// - **Checked ownership:** acquiring twice or releasing without holding is
///   rejected, never silently applied.
///
/// No fairness is layered on top of the condvars. An agent can starve if its
/// neighbors keep winning the race for a shared resource.
pub struct ResourceRing {
    state: Mutex<RingState>,
    waiters: Vec<Condvar>,
    observer: Option<Arc<dyn RingObserver>>,
}

impl ResourceRing {
    /// Create a ring of `size` resources, all free.
    pub fn new(size: usize) -> Result<Self, RingError> {
        if size < 2 {
            return Err(RingError::InvalidSize(size));
        }

        Ok(Self {
            state: Mutex::new(RingState {
                available: vec![true; size],
                holding: vec![false; size],
                closed: false,
            }),
            waiters: (0..size).map(|_| Condvar::new()).collect(),
            observer: None,
        })
    }

    /// Create a ring that reports every acquire and release to `observer`.
    pub fn with_observer(size: usize, observer: Arc<dyn RingObserver>) -> Result<Self, RingError> {
        let mut ring = Self::new(size)?;
        ring.observer = Some(observer);
        Ok(ring)
    }

    /// Number of resources (and agents) in the ring.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Always false; a ring has at least two resources.
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// The `(right, left)` resource indices used by `agent`.
    pub fn pair(&self, agent: usize) -> Result<(usize, usize), RingError> {
        let size = self.len();
        if agent >= size {
            return Err(RingError::AgentOutOfRange { agent, size });
        }
        Ok((agent, (agent + 1) % size))
    }

    /// Block until both of `agent`'s resources are free, then take them.
    ///
    /// Returns `Err(RingError::Closed)` if the ring is closed before or
    /// while the agent waits.
    pub fn acquire_pair(&self, agent: usize) -> Result<(), RingError> {
        let (right, left) = self.pair(agent)?;
        let mut state = self.state.lock();
        Self::check_acquire(&state, agent)?;

        while !state.pair_free(right, left) {
            let held = if state.available[right] { left } else { right };
            self.waiters[held].wait(&mut state);

            if state.closed {
                return Err(RingError::Closed);
            }
        }

        self.take(&mut state, agent, right, left);
        Ok(())
    }

    /// Like `acquire_pair()`, but give up after `timeout`.
    ///
    /// Returns `Ok(true)` if the pair was taken and `Ok(false)` if the
    /// deadline passed first. A timed-out caller holds nothing.
    pub fn acquire_pair_timeout(&self, agent: usize, timeout: Duration) -> Result<bool, RingError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.acquire_pair(agent).map(|()| true);
        };

        let (right, left) = self.pair(agent)?;
        let mut state = self.state.lock();
        Self::check_acquire(&state, agent)?;

        while !state.pair_free(right, left) {
            let held = if state.available[right] { left } else { right };
            let result = self.waiters[held].wait_until(&mut state, deadline);

            if state.closed {
                return Err(RingError::Closed);
            }
            if result.timed_out() && !state.pair_free(right, left) {
                tracing::debug!(agent, right, left, ?timeout, "pair acquire timed out");
                return Ok(false);
            }
        }

        self.take(&mut state, agent, right, left);
        Ok(true)
    }

    /// Take the pair only if both resources are free right now.
    pub fn try_acquire_pair(&self, agent: usize) -> Result<bool, RingError> {
        let (right, left) = self.pair(agent)?;
        let mut state = self.state.lock();
        Self::check_acquire(&state, agent)?;

        if !state.pair_free(right, left) {
            return Ok(false);
        }

        self.take(&mut state, agent, right, left);
        Ok(true)
    }

    /// Put both of `agent`'s resources back and wake their waiters.
    ///
    /// Returns `Err(RingError::NotHolding)` if the agent does not hold its
    /// pair, which includes releasing twice in a row. Releases are accepted
    /// after `close()` so an agent mid-use can still put its resources down.
    pub fn release_pair(&self, agent: usize) -> Result<(), RingError> {
        let (right, left) = self.pair(agent)?;

        {
            let mut state = self.state.lock();
            if !state.holding[agent] {
                return Err(RingError::NotHolding(agent));
            }

            // Drops before `state`, so waiters are woken even if the
            // observer unwinds.
            let _wake = WakeOnDrop {
                waiters: &self.waiters,
                resources: [right, left],
            };

            state.available[right] = true;
            state.available[left] = true;
            state.holding[agent] = false;
            self.emit(RingEvent::Released { agent, right, left });
        }

        Ok(())
    }

    /// Close the ring and wake every waiter.
    ///
    /// Blocked and future acquires fail with `RingError::Closed`.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }

        tracing::debug!(size = self.len(), "ring closed");
        for waiter in &self.waiters {
            waiter.notify_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether `agent` currently holds its pair.
    pub fn is_holding(&self, agent: usize) -> Result<bool, RingError> {
        self.pair(agent)?;
        Ok(self.state.lock().holding[agent])
    }

    /// Number of agents currently holding their pair.
    pub fn eating_count(&self) -> usize {
        self.state.lock().holding.iter().filter(|h| **h).count()
    }

    /// Consistent copy of the ring state, taken under the lock.
    pub fn snapshot(&self) -> RingSnapshot {
        let state = self.state.lock();
        RingSnapshot {
            available: state.available.clone(),
            holders: state
                .holding
                .iter()
                .enumerate()
                .filter_map(|(agent, holding)| holding.then_some(agent))
                .collect(),
            closed: state.closed,
        }
    }

    fn check_acquire(state: &RingState, agent: usize) -> Result<(), RingError> {
        if state.closed {
            return Err(RingError::Closed);
        }
        if state.holding[agent] {
            return Err(RingError::AlreadyHolding(agent));
        }
        Ok(())
    }

    /// Mark the pair held. The event goes out first so an unwinding
    /// observer leaves the pair free.
    fn take(&self, state: &mut RingState, agent: usize, right: usize, left: usize) {
        self.emit(RingEvent::Acquired { agent, right, left });
        state.available[right] = false;
        state.available[left] = false;
        state.holding[agent] = true;
    }

    /// Report an event. Called with the ring lock held.
    fn emit(&self, event: RingEvent) {
        tracing::debug!(agent = event.agent(), "{}", event);
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

/// Broadcasts on a set of resource condvars when dropped.
struct WakeOnDrop<'a> {
    waiters: &'a [Condvar],
    resources: [usize; 2],
}

impl Drop for WakeOnDrop<'_> {
    fn drop(&mut self) {
        for resource in self.resources {
            self.waiters[resource].notify_all();
        }
    }
}

impl std::fmt::Debug for ResourceRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRing")
            .field("size", &self.len())
            .field("state", &self.snapshot())
            .finish()
    }
}
