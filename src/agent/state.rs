// ABOUTME: Agent lifecycle states and a shared cell for observing them.
// ABOUTME: The cell is written by the agent thread and read lock-free by anyone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Where an agent is in its think/acquire/eat/release cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Created but not yet running.
    Idle = 0,
    /// Running its think workload; touches no resources.
    Thinking = 1,
    /// Blocked in pair acquisition.
    Waiting = 2,
    /// Holding both resources and running its eat workload.
    Eating = 3,
    /// Putting its resources back.
    Releasing = 4,
    /// Loop finished.
    Stopped = 5,
}

impl AgentState {
    /// Convert from u8 value to AgentState.
    fn from_u8(value: u8) -> Self {
        match value {
            0 => AgentState::Idle,
            1 => AgentState::Thinking,
            2 => AgentState::Waiting,
            3 => AgentState::Eating,
            4 => AgentState::Releasing,
            _ => AgentState::Stopped,
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Idle => write!(f, "idle"),
            AgentState::Thinking => write!(f, "thinking"),
            AgentState::Waiting => write!(f, "waiting"),
            AgentState::Eating => write!(f, "eating"),
            AgentState::Releasing => write!(f, "releasing"),
            AgentState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Shared, cloneable view of one agent's current state.
#[derive(Clone, Debug)]
pub struct StateCell {
    state: Arc<AtomicU8>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    /// Create a cell in the `Idle` state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(AgentState::Idle as u8)),
        }
    }

    pub fn get(&self) -> AgentState {
        AgentState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: AgentState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}
