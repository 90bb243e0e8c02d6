// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use pairlock::prelude::*;` to get started quickly.

pub use crate::agent::{
    Agent, AgentState, AgentStats, FnWorkload, NoopWorkload, SleepWorkload, SpinWorkload,
    StateCell, Workload,
};
pub use crate::config::SessionConfig;
pub use crate::error::{ConfigError, PairlockError, RingError, SessionError};
pub use crate::event::{EventLog, RingEvent, RingObserver};
pub use crate::ring::{PairGuard, ResourceRing, RingSnapshot};
pub use crate::session::{Session, SessionReport};
