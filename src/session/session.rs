// ABOUTME: Session lifecycle - builds the ring, spawns one thread per agent, joins them.
// ABOUTME: Stop raises the shared flag and closes the ring so blocked agents return.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::report::SessionReport;
use crate::agent::{Agent, AgentState, AgentStats, StateCell, Workload};
use crate::config::SessionConfig;
use crate::error::{RingError, SessionError};
use crate::event::RingObserver;
use crate::ring::ResourceRing;

/// A running agent thread.
struct AgentHandle {
    id: usize,
    state: StateCell,
    thread: JoinHandle<Result<AgentStats, RingError>>,
}

/// One coordination session: a ring and the agents sharing it.
///
/// The ring lives as long as the session. Agents get an `Arc` to it at
/// spawn time; there is no global state.
///
/// Dropping a session that was not joined stops and joins its agents.
pub struct Session {
    ring: Arc<ResourceRing>,
    stop: Arc<AtomicBool>,
    agents: Vec<AgentHandle>,
    started: Instant,
}

impl Session {
    /// Validate `config`, build the ring, and start every agent.
    pub fn start(config: &SessionConfig, workload: Arc<dyn Workload>) -> Result<Self, SessionError> {
        config.validate()?;
        let ring = ResourceRing::new(config.agents)?;
        Self::spawn(Arc::new(ring), config, workload)
    }

    /// Like `start()`, reporting every ring event to `observer`.
    pub fn start_with_observer(
        config: &SessionConfig,
        workload: Arc<dyn Workload>,
        observer: Arc<dyn RingObserver>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let ring = ResourceRing::with_observer(config.agents, observer)?;
        Self::spawn(Arc::new(ring), config, workload)
    }

    fn spawn(
        ring: Arc<ResourceRing>,
        config: &SessionConfig,
        workload: Arc<dyn Workload>,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            ring,
            stop: Arc::new(AtomicBool::new(false)),
            agents: Vec::with_capacity(config.agents),
            started: Instant::now(),
        };

        for id in 0..config.agents {
            let agent = Agent::new(id, session.ring.clone(), workload.clone())?
                .iterations(config.iterations)
                .acquire_timeout(config.acquire_timeout())
                .stop_flag(session.stop.clone());
            let state = agent.state();
            let on_failure = StopOnFailure {
                ring: session.ring.clone(),
                stop: session.stop.clone(),
                armed: true,
            };

            // On failure the partially built session is dropped, which stops
            // and joins the agents already running.
            let thread = thread::Builder::new()
                .name(format!("agent-{}", id))
                .spawn(move || {
                    let mut on_failure = on_failure;
                    let result = agent.run();
                    on_failure.armed = result.is_err();
                    result
                })
                .map_err(SessionError::Spawn)?;

            session.agents.push(AgentHandle { id, state, thread });
        }

        tracing::info!(
            agents = config.agents,
            iterations = ?config.iterations,
            "session started"
        );
        Ok(session)
    }

    /// The shared ring.
    pub fn ring(&self) -> &Arc<ResourceRing> {
        &self.ring
    }

    /// Current state of every agent, ordered by id.
    pub fn states(&self) -> Vec<AgentState> {
        self.agents.iter().map(|a| a.state.get()).collect()
    }

    /// Whether every agent thread has returned.
    pub fn is_finished(&self) -> bool {
        self.agents.iter().all(|a| a.thread.is_finished())
    }

    /// Ask every agent to stop.
    ///
    /// Thinking and eating agents finish their current phase first. Agents
    /// blocked on the ring are woken and return at once.
    pub fn stop(&self) {
        stop_agents(&self.ring, &self.stop);
    }

    /// Wait for every agent to return and collect their stats.
    ///
    /// Without a prior `stop()` this waits for the iteration budget to run
    /// out, which never happens for unbounded sessions. All agents are
    /// joined even if some fail; the first failure is returned.
    pub fn join(mut self) -> Result<SessionReport, SessionError> {
        let agents = std::mem::take(&mut self.agents);
        let size = agents.len();
        let mut stats = Vec::with_capacity(size);
        let mut failure = None;

        for handle in agents {
            match handle.thread.join() {
                Ok(Ok(agent_stats)) => stats.push(agent_stats),
                Ok(Err(e)) => {
                    failure.get_or_insert(SessionError::Ring(e));
                }
                Err(_) => {
                    tracing::error!(agent = handle.id, "agent panicked");
                    failure.get_or_insert(SessionError::AgentPanicked(handle.id));
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        let report = SessionReport {
            agents: size,
            elapsed: self.started.elapsed(),
            stats,
        };
        tracing::info!(
            meals = report.total_meals(),
            elapsed = ?report.elapsed,
            "session finished"
        );
        Ok(report)
    }

    /// Stop every agent, join them, and release the ring.
    pub fn shutdown(self) -> Result<SessionReport, SessionError> {
        self.stop();
        self.join()
    }
}

fn stop_agents(ring: &ResourceRing, stop: &AtomicBool) {
    if !stop.swap(true, Ordering::SeqCst) {
        tracing::info!("session stopping");
    }
    ring.close();
}

/// Stops the whole session when an agent thread returns an error or unwinds.
///
/// Lives on the agent's own thread, so neighbors blocked on the failed agent
/// are released without waiting for `join()` to reach it.
struct StopOnFailure {
    ring: Arc<ResourceRing>,
    stop: Arc<AtomicBool>,
    armed: bool,
}

impl Drop for StopOnFailure {
    fn drop(&mut self) {
        if self.armed {
            stop_agents(&self.ring, &self.stop);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.agents.is_empty() {
            return;
        }
        self.stop();
        for handle in self.agents.drain(..) {
            let _ = handle.thread.join();
        }
    }
}
