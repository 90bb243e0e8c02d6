// ABOUTME: RAII guard for a held resource pair.
// ABOUTME: Releases the pair on drop so a panicking holder cannot wedge its neighbors.

use std::time::Duration;

use super::ring::ResourceRing;
use crate::error::RingError;

/// Proof that an agent holds its pair on a ring.
///
/// Call `release()` to put the pair down and observe the result. If the
/// guard is dropped without that (early return or unwind), the pair is
/// released anyway.
#[must_use = "dropping the guard releases the pair immediately"]
#[derive(Debug)]
pub struct PairGuard<'a> {
    ring: &'a ResourceRing,
    agent: usize,
    released: bool,
}

impl PairGuard<'_> {
    /// The agent holding the pair.
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Release the pair.
    pub fn release(mut self) -> Result<(), RingError> {
        self.released = true;
        self.ring.release_pair(self.agent)
    }
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.ring.release_pair(self.agent) {
            tracing::warn!(agent = self.agent, error = %e, "failed to release pair on drop");
        }
    }
}

impl ResourceRing {
    /// Block until `agent`'s pair is free and return a guard holding it.
    pub fn lock_pair(&self, agent: usize) -> Result<PairGuard<'_>, RingError> {
        self.acquire_pair(agent)?;
        Ok(PairGuard {
            ring: self,
            agent,
            released: false,
        })
    }

    /// Like `lock_pair()`, but return `Ok(None)` if `timeout` passes first.
    pub fn lock_pair_timeout(
        &self,
        agent: usize,
        timeout: Duration,
    ) -> Result<Option<PairGuard<'_>>, RingError> {
        if !self.acquire_pair_timeout(agent, timeout)? {
            return Ok(None);
        }
        Ok(Some(PairGuard {
            ring: self,
            agent,
            released: false,
        }))
    }
}
