// ABOUTME: Opaque think/eat work injected into agents.
// ABOUTME: Ships sleep, spin, closure, and no-op workloads.

use std::time::Duration;

/// The work an agent does between ring operations.
///
/// Both calls must be bounded and must not touch the ring. `eat` runs while
/// the agent holds its pair.
pub trait Workload: Send + Sync {
    fn think(&self, agent: usize);
    fn eat(&self, agent: usize);
}

/// Sleeps for a fixed time in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepWorkload {
    pub think: Duration,
    pub eat: Duration,
}

impl SleepWorkload {
    pub fn new(think: Duration, eat: Duration) -> Self {
        Self { think, eat }
    }
}

impl Workload for SleepWorkload {
    fn think(&self, _agent: usize) {
        if !self.think.is_zero() {
            std::thread::sleep(self.think);
        }
    }

    fn eat(&self, _agent: usize) {
        if !self.eat.is_zero() {
            std::thread::sleep(self.eat);
        }
    }
}

/// Burns CPU with a bounded counting loop in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinWorkload {
    pub think_spins: u64,
    pub eat_spins: u64,
}

impl SpinWorkload {
    pub fn new(think_spins: u64, eat_spins: u64) -> Self {
        Self {
            think_spins,
            eat_spins,
        }
    }

    fn spin(count: u64) {
        let mut i = 0u64;
        while std::hint::black_box(i) < count {
            i += 1;
        }
    }
}

impl Workload for SpinWorkload {
    fn think(&self, _agent: usize) {
        Self::spin(self.think_spins);
    }

    fn eat(&self, _agent: usize) {
        Self::spin(self.eat_spins);
    }
}

/// Does nothing; agents go straight back to the ring.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWorkload;

impl Workload for NoopWorkload {
    fn think(&self, _agent: usize) {}
    fn eat(&self, _agent: usize) {}
}

/// Workload built from two closures taking the agent id.
pub struct FnWorkload<T, E> {
    think: T,
    eat: E,
}

impl<T, E> FnWorkload<T, E>
where
    T: Fn(usize) + Send + Sync,
    E: Fn(usize) + Send + Sync,
{
    pub fn new(think: T, eat: E) -> Self {
        Self { think, eat }
    }
}

impl<T, E> Workload for FnWorkload<T, E>
where
    T: Fn(usize) + Send + Sync,
    E: Fn(usize) + Send + Sync,
{
    fn think(&self, agent: usize) {
        (self.think)(agent);
    }

    fn eat(&self, agent: usize) {
        (self.eat)(agent);
    }
}
