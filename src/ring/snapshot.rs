// ABOUTME: Point-in-time copy of a resource ring's availability state.
// ABOUTME: Used for diagnostics and for checking ring invariants in tests.

use serde::Serialize;

/// State of a ring as seen under its lock at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingSnapshot {
    /// `true` when resource `i` is free.
    pub available: Vec<bool>,
    /// Agents holding their pair, ascending.
    pub holders: Vec<usize>,
    pub closed: bool,
}

impl RingSnapshot {
    /// Number of held resources.
    pub fn held_count(&self) -> usize {
        self.available.iter().filter(|free| !**free).count()
    }

    /// Check the ring invariants against this snapshot.
    ///
    /// Holds when every holder has both of its resources marked held, no
    /// resource is claimed by two holders, and exactly two resources are held
    /// per holder.
    pub fn is_consistent(&self) -> bool {
        let size = self.available.len();
        let mut claimed = vec![false; size];

        for &agent in &self.holders {
            if agent >= size {
                return false;
            }
            for resource in [agent, (agent + 1) % size] {
                if self.available[resource] || claimed[resource] {
                    return false;
                }
                claimed[resource] = true;
            }
        }

        self.held_count() == 2 * self.holders.len()
    }
}
