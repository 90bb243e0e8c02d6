// ABOUTME: Agent module - the concurrent tasks that share the resource ring.
// ABOUTME: Provides the agent loop, its lifecycle states, and injectable workloads.

mod runner;
mod state;
mod workload;

pub use runner::{Agent, AgentStats};
pub use state::{AgentState, StateCell};
pub use workload::{FnWorkload, NoopWorkload, SleepWorkload, SpinWorkload, Workload};

#[cfg(test)]
mod state_test;
