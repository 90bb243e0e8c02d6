// ABOUTME: Root module for pairlock - deadlock-free pair allocation over a resource ring.
// ABOUTME: Re-exports all public types from submodules.

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod prelude;
pub mod ring;
pub mod session;

pub use error::PairlockError;
