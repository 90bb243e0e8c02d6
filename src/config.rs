// ABOUTME: Session configuration loaded from defaults, JSON files, and environment.
// ABOUTME: Validation runs before any ring or thread is created.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::{SleepWorkload, Workload};
use crate::error::ConfigError;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "PAIRLOCK_";

/// Settings for one coordination session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Number of agents, and of resources in the ring.
    pub agents: usize,

    /// Meals per agent. `None` runs until stopped.
    pub iterations: Option<u64>,

    /// Think phase duration in milliseconds.
    pub think_ms: u64,

    /// Eat phase duration in milliseconds.
    pub eat_ms: u64,

    /// Per-attempt acquire timeout in milliseconds. `None` blocks forever.
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agents: 5,
            iterations: None,
            think_ms: 10,
            eat_ms: 10,
            acquire_timeout_ms: None,
        }
    }
}

impl SessionConfig {
    /// Create a default configuration for `agents` agents.
    pub fn new(agents: usize) -> Self {
        Self {
            agents,
            ..Self::default()
        }
    }

    /// Set the meals per agent.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Set think and eat durations.
    pub fn timing(mut self, think_ms: u64, eat_ms: u64) -> Self {
        self.think_ms = think_ms;
        self.eat_ms = eat_ms;
        self
    }

    /// Set the per-attempt acquire timeout.
    pub fn acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = Some(timeout_ms);
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `PAIRLOCK_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply `PAIRLOCK_*` overrides from an arbitrary lookup.
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            let name = format!("{}{}", ENV_PREFIX, key);
            lookup(name.as_str()).map(|value| (name, value))
        };

        if let Some((name, value)) = var("AGENTS") {
            self.agents = parse_env(&name, &value)?;
        }
        if let Some((name, value)) = var("ITERATIONS") {
            self.iterations = Some(parse_env(&name, &value)?);
        }
        if let Some((name, value)) = var("THINK_MS") {
            self.think_ms = parse_env(&name, &value)?;
        }
        if let Some((name, value)) = var("EAT_MS") {
            self.eat_ms = parse_env(&name, &value)?;
        }
        if let Some((name, value)) = var("ACQUIRE_TIMEOUT_MS") {
            self.acquire_timeout_ms = Some(parse_env(&name, &value)?);
        }

        Ok(self)
    }

    /// Reject configurations no session can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents < 2 {
            return Err(ConfigError::Invalid(format!(
                "agents must be at least 2, got {}",
                self.agents
            )));
        }
        if self.acquire_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "acquire_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Sleep-based workload using the configured phase durations.
    pub fn workload(&self) -> Arc<dyn Workload> {
        Arc::new(SleepWorkload::new(
            Duration::from_millis(self.think_ms),
            Duration::from_millis(self.eat_ms),
        ))
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        name: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
