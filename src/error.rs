// ABOUTME: Defines all error types for the pairlock library using thiserror.
// ABOUTME: Each submodule has its own error enum, unified under PairlockError.

/// Top-level error type for the pairlock library.
#[derive(Debug, thiserror::Error)]
pub enum PairlockError {
    #[error("Ring error: {0}")]
    Ring(#[from] RingError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors from resource ring operations.
///
/// Everything except `Closed` is a caller-contract violation: the ring
/// rejects the call instead of corrupting its availability state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    #[error("ring needs at least 2 resources, got {0}")]
    InvalidSize(usize),

    #[error("agent {agent} is out of range for a ring of {size}")]
    AgentOutOfRange { agent: usize, size: usize },

    #[error("agent {0} already holds its resources")]
    AlreadyHolding(usize),

    #[error("agent {0} does not hold its resources")]
    NotHolding(usize),

    #[error("ring is closed")]
    Closed,
}

/// Errors from loading or validating session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("environment variable {name}: {message}")]
    Env { name: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from starting or joining a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ring error: {0}")]
    Ring(#[from] RingError),

    #[error("Failed to spawn agent thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Agent {0} panicked")]
    AgentPanicked(usize),
}
