// ABOUTME: Summary of a finished session, serializable for the CLI's JSON output.

use std::time::Duration;

use serde::Serialize;

use crate::agent::AgentStats;

/// Per-agent results and totals for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Ring size.
    pub agents: usize,

    /// Wall-clock time from start to the last join.
    pub elapsed: Duration,

    /// Stats for every agent, ordered by id.
    pub stats: Vec<AgentStats>,
}

impl SessionReport {
    pub fn total_meals(&self) -> u64 {
        self.stats.iter().map(|s| s.meals).sum()
    }

    pub fn total_timeouts(&self) -> u64 {
        self.stats.iter().map(|s| s.timeouts).sum()
    }

    /// Longest acquire wait seen by any agent.
    pub fn max_wait(&self) -> Duration {
        self.stats
            .iter()
            .map(|s| s.max_wait)
            .max()
            .unwrap_or_default()
    }
}

impl std::fmt::Display for SessionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} agents, {} meals, {} timeouts in {:?}",
            self.agents,
            self.total_meals(),
            self.total_timeouts(),
            self.elapsed
        )?;
        for stats in &self.stats {
            writeln!(
                f,
                "  agent {}: {} meals, {} timeouts, max wait {:?}",
                stats.agent, stats.meals, stats.timeouts, stats.max_wait
            )?;
        }
        Ok(())
    }
}
