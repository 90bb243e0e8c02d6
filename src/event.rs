// ABOUTME: Diagnostic events emitted by the resource ring on acquire and release.
// ABOUTME: Observers registered on a ring see every event in lock order.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Something that happened to an agent's resource pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RingEvent {
    /// The agent now holds both resources.
    Acquired {
        agent: usize,
        right: usize,
        left: usize,
    },

    /// The agent put both resources back.
    Released {
        agent: usize,
        right: usize,
        left: usize,
    },
}

impl RingEvent {
    /// The agent the event belongs to.
    pub fn agent(&self) -> usize {
        match self {
            RingEvent::Acquired { agent, .. } | RingEvent::Released { agent, .. } => *agent,
        }
    }
}

impl std::fmt::Display for RingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RingEvent::Acquired { agent, right, left } => {
                write!(f, "{} got resources {} and {}", agent, right, left)
            }
            RingEvent::Released { agent, right, left } => {
                write!(f, "{} released resources {} and {}", agent, right, left)
            }
        }
    }
}

/// Hook invoked by the ring for every event.
///
/// Observers run while the ring lock is held, so the sequence they see is
/// exactly the order in which state changed. They must return quickly and
/// must not call back into the ring.
///
/// A panicking observer unwinds out of the ring call with the ring left
/// consistent: a failed acquire leaves the pair free, and a release still
/// frees the pair and wakes its waiters.
pub trait RingObserver: Send + Sync {
    fn on_event(&self, event: &RingEvent);
}

/// Observer that keeps every event in memory.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<RingEvent>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of all events recorded so far.
    pub fn events(&self) -> Vec<RingEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl RingObserver for EventLog {
    fn on_event(&self, event: &RingEvent) {
        self.events.lock().push(*event);
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;
