// ABOUTME: Agent runner - drives the think/acquire/eat/release loop for one agent.
// ABOUTME: Tracks per-agent statistics and honors stop flags and iteration budgets.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::state::{AgentState, StateCell};
use super::workload::Workload;
use crate::error::RingError;
use crate::ring::{PairGuard, ResourceRing};

/// Counters collected over one agent's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// The agent these counters belong to.
    pub agent: usize,

    /// Completed eat phases.
    pub meals: u64,

    /// Acquire attempts that gave up at the timeout.
    pub timeouts: u64,

    /// Time spent blocked in successful acquires.
    pub total_wait: Duration,

    /// Longest single successful acquire.
    pub max_wait: Duration,
}

impl AgentStats {
    fn new(agent: usize) -> Self {
        Self {
            agent,
            ..Self::default()
        }
    }

    fn record_wait(&mut self, waited: Duration) {
        self.total_wait += waited;
        self.max_wait = self.max_wait.max(waited);
    }
}

/// One agent bound to a ring position.
///
/// The agent loops: think, acquire its pair, eat, release. It stops when its
/// iteration budget is spent, its stop flag is raised, or the ring closes
/// while it waits.
pub struct Agent {
    id: usize,
    ring: Arc<ResourceRing>,
    workload: Arc<dyn Workload>,
    state: StateCell,
    stop: Arc<AtomicBool>,
    iterations: Option<u64>,
    acquire_timeout: Option<Duration>,
}

impl Agent {
    /// Create an agent for ring position `id`.
    ///
    /// Returns `Err(RingError::AgentOutOfRange)` if the ring has no such
    /// position.
    pub fn new(
        id: usize,
        ring: Arc<ResourceRing>,
        workload: Arc<dyn Workload>,
    ) -> Result<Self, RingError> {
        ring.pair(id)?;
        Ok(Self {
            id,
            ring,
            workload,
            state: StateCell::new(),
            stop: Arc::new(AtomicBool::new(false)),
            iterations: None,
            acquire_timeout: None,
        })
    }

    /// Limit the number of meals. `None` runs until stopped.
    pub fn iterations(mut self, iterations: Option<u64>) -> Self {
        self.iterations = iterations;
        self
    }

    /// Give up each acquire after `timeout` and go back to thinking.
    pub fn acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Share a stop flag with other agents.
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Handle for observing this agent's state from another thread.
    pub fn state(&self) -> StateCell {
        self.state.clone()
    }

    /// Run the loop to completion on the current thread.
    ///
    /// A closed ring ends the loop normally. Any other ring error is a
    /// contract violation and is returned.
    pub fn run(self) -> Result<AgentStats, RingError> {
        let _span = tracing::debug_span!("agent", id = self.id).entered();
        let result = self.run_loop();
        self.state.set(AgentState::Stopped);

        match &result {
            Ok(stats) => tracing::debug!(
                meals = stats.meals,
                timeouts = stats.timeouts,
                "agent stopped"
            ),
            Err(e) => tracing::error!(error = %e, "agent failed"),
        }
        result
    }

    fn run_loop(&self) -> Result<AgentStats, RingError> {
        let mut stats = AgentStats::new(self.id);

        loop {
            if self.should_stop(&stats) {
                return Ok(stats);
            }

            self.state.set(AgentState::Thinking);
            self.workload.think(self.id);

            if self.should_stop(&stats) {
                return Ok(stats);
            }

            self.state.set(AgentState::Waiting);
            let started = Instant::now();
            let guard = match self.acquire() {
                Ok(Some(guard)) => guard,
                Ok(None) => {
                    stats.timeouts += 1;
                    tracing::warn!(timeouts = stats.timeouts, "gave up waiting for resources");
                    continue;
                }
                Err(RingError::Closed) => return Ok(stats),
                Err(e) => return Err(e),
            };
            stats.record_wait(started.elapsed());

            self.state.set(AgentState::Eating);
            self.workload.eat(self.id);

            self.state.set(AgentState::Releasing);
            guard.release()?;
            stats.meals += 1;
        }
    }

    fn acquire(&self) -> Result<Option<PairGuard<'_>>, RingError> {
        match self.acquire_timeout {
            Some(timeout) => self.ring.lock_pair_timeout(self.id, timeout),
            None => self.ring.lock_pair(self.id).map(Some),
        }
    }

    fn should_stop(&self, stats: &AgentStats) -> bool {
        if self.stop.load(Ordering::SeqCst) {
            return true;
        }
        self.iterations.is_some_and(|limit| stats.meals >= limit)
    }
}
