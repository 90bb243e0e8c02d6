// ABOUTME: Resource ring module - the pair allocation engine shared by all agents.
// ABOUTME: Contains the ring itself, RAII pair guards, and state snapshots.

mod guard;
mod ring;
mod snapshot;

pub use guard::PairGuard;
pub use ring::ResourceRing;
pub use snapshot::RingSnapshot;

#[cfg(test)]
mod ring_test;
