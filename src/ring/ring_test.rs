// ABOUTME: Tests for the resource ring's pair acquire and release semantics.
// ABOUTME: Covers contract checks, blocking, wake-ups, timeouts, and close.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use super::ring::ResourceRing;
use crate::error::RingError;
use crate::event::{EventLog, RingEvent, RingObserver};

/// Run `acquire_pair` on a background thread and report when it returns.
fn spawn_acquire(
    ring: &Arc<ResourceRing>,
    agent: usize,
) -> mpsc::Receiver<Result<(), RingError>> {
    let ring = ring.clone();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(ring.acquire_pair(agent));
    });
    rx
}

/// Observer that panics on acquires, releases, or both.
struct PanickingObserver {
    on_acquire: bool,
    on_release: bool,
}

impl RingObserver for PanickingObserver {
    fn on_event(&self, event: &RingEvent) {
        match event {
            RingEvent::Acquired { .. } if self.on_acquire => panic!("observer failed on acquire"),
            RingEvent::Released { .. } if self.on_release => panic!("observer failed on release"),
            _ => {}
        }
    }
}

/// Give a background acquire time to reach its wait.
fn settle() {
    thread::sleep(Duration::from_millis(50));
}

#[test]
fn test_new_rejects_rings_smaller_than_two() {
    assert_eq!(ResourceRing::new(0).unwrap_err(), RingError::InvalidSize(0));
    assert_eq!(ResourceRing::new(1).unwrap_err(), RingError::InvalidSize(1));
    assert!(ResourceRing::new(2).is_ok());
}

#[test]
fn test_new_ring_starts_all_free() {
    let ring = ResourceRing::new(5).unwrap();
    let snap = ring.snapshot();
    assert_eq!(snap.available, vec![true; 5]);
    assert!(snap.holders.is_empty());
    assert!(!snap.closed);
    assert_eq!(ring.len(), 5);
    assert_eq!(ring.eating_count(), 0);
}

#[test]
fn test_pair_wraps_around_ring() {
    let ring = ResourceRing::new(5).unwrap();
    assert_eq!(ring.pair(0).unwrap(), (0, 1));
    assert_eq!(ring.pair(3).unwrap(), (3, 4));
    assert_eq!(ring.pair(4).unwrap(), (4, 0));
}

#[test]
fn test_out_of_range_agent_rejected() {
    let ring = ResourceRing::new(5).unwrap();
    let expected = RingError::AgentOutOfRange { agent: 5, size: 5 };

    assert_eq!(ring.acquire_pair(5).unwrap_err(), expected);
    assert_eq!(ring.release_pair(5).unwrap_err(), expected);
    assert_eq!(ring.try_acquire_pair(5).unwrap_err(), expected);
    assert_eq!(ring.is_holding(5).unwrap_err(), expected);
}

#[test]
fn test_acquire_marks_both_resources_held() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(4).unwrap();

    let snap = ring.snapshot();
    assert_eq!(snap.available, vec![false, true, true, true, false]);
    assert_eq!(snap.holders, vec![4]);
    assert!(snap.is_consistent());
    assert!(ring.is_holding(4).unwrap());
}

#[test]
fn test_release_frees_both_resources() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(2).unwrap();
    ring.release_pair(2).unwrap();

    let snap = ring.snapshot();
    assert_eq!(snap.available, vec![true; 5]);
    assert!(snap.holders.is_empty());
    assert!(!ring.is_holding(2).unwrap());
}

#[test]
fn test_acquire_twice_rejected() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(1).unwrap();

    assert_eq!(ring.acquire_pair(1).unwrap_err(), RingError::AlreadyHolding(1));
    assert_eq!(ring.try_acquire_pair(1).unwrap_err(), RingError::AlreadyHolding(1));
}

#[test]
fn test_release_without_acquire_rejected() {
    let ring = ResourceRing::new(5).unwrap();
    assert_eq!(ring.release_pair(3).unwrap_err(), RingError::NotHolding(3));
    assert_eq!(ring.snapshot().available, vec![true; 5]);
}

#[test]
fn test_double_release_rejected() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(0).unwrap();
    ring.release_pair(0).unwrap();

    // Neighbor takes resource 1 in between; a double release must not free it
    ring.acquire_pair(1).unwrap();
    assert_eq!(ring.release_pair(0).unwrap_err(), RingError::NotHolding(0));

    let snap = ring.snapshot();
    assert!(!snap.available[1]);
    assert!(snap.is_consistent());
}

#[test]
fn test_try_acquire_fails_when_neighbor_holds() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(0).unwrap();

    // Agent 1 needs {1,2}; 1 is held by agent 0
    assert!(!ring.try_acquire_pair(1).unwrap());
    // Agent 4 needs {4,0}; 0 is held by agent 0
    assert!(!ring.try_acquire_pair(4).unwrap());
    // Agent 2 needs {2,3}; both free
    assert!(ring.try_acquire_pair(2).unwrap());

    // The failed attempts left nothing behind
    let snap = ring.snapshot();
    assert_eq!(snap.holders, vec![0, 2]);
    assert!(snap.is_consistent());
}

#[test]
fn test_two_agent_ring_shares_both_resources() {
    let ring = ResourceRing::new(2).unwrap();
    assert_eq!(ring.pair(0).unwrap(), (0, 1));
    assert_eq!(ring.pair(1).unwrap(), (1, 0));

    ring.acquire_pair(0).unwrap();
    assert!(!ring.try_acquire_pair(1).unwrap());
    ring.release_pair(0).unwrap();
    assert!(ring.try_acquire_pair(1).unwrap());
}

#[test]
fn test_disjoint_pairs_acquire_in_parallel() {
    let ring = Arc::new(ResourceRing::new(5).unwrap());

    let first = spawn_acquire(&ring, 0);
    let second = spawn_acquire(&ring, 2);

    assert!(first.recv_timeout(Duration::from_secs(1)).unwrap().is_ok());
    assert!(second.recv_timeout(Duration::from_secs(1)).unwrap().is_ok());
    assert_eq!(ring.eating_count(), 2);
}

#[test]
fn test_middle_agent_blocks_until_both_neighbors_release() {
    let ring = Arc::new(ResourceRing::new(5).unwrap());
    ring.acquire_pair(0).unwrap();
    ring.acquire_pair(2).unwrap();

    // Agent 1 needs {1,2}: 1 held by agent 0, 2 held by agent 2
    let waiting = spawn_acquire(&ring, 1);
    settle();
    assert!(waiting.try_recv().is_err(), "agent 1 should be blocked");

    // One resource freed is not enough
    ring.release_pair(0).unwrap();
    settle();
    assert!(waiting.try_recv().is_err(), "agent 1 should still be blocked");
    assert!(!ring.is_holding(1).unwrap());

    ring.release_pair(2).unwrap();
    let result = waiting.recv_timeout(Duration::from_secs(1));
    assert!(matches!(result, Ok(Ok(()))), "agent 1 should proceed, got {:?}", result);
    assert!(ring.is_holding(1).unwrap());
}

#[test]
fn test_waiter_rechecks_after_neighbor_reclaims() {
    let ring = Arc::new(ResourceRing::new(5).unwrap());
    ring.acquire_pair(0).unwrap();

    // Agent 1 waits on resource 1
    let waiting = spawn_acquire(&ring, 1);
    settle();

    // Agent 2 takes resource 2 while agent 1 is parked, then 0 releases 1
    ring.acquire_pair(2).unwrap();
    ring.release_pair(0).unwrap();
    settle();
    assert!(waiting.try_recv().is_err(), "woken agent must recheck resource 2");

    ring.release_pair(2).unwrap();
    assert!(waiting.recv_timeout(Duration::from_secs(1)).unwrap().is_ok());
    assert!(ring.snapshot().is_consistent());
}

#[test]
fn test_release_wakes_every_waiter_on_resource() {
    let ring = Arc::new(ResourceRing::new(5).unwrap());
    ring.acquire_pair(1).unwrap();

    // Agent 0 waits on resource 1, agent 2 waits on resource 2
    let left_neighbor = spawn_acquire(&ring, 0);
    let right_neighbor = spawn_acquire(&ring, 2);
    settle();

    ring.release_pair(1).unwrap();

    assert!(left_neighbor.recv_timeout(Duration::from_secs(1)).unwrap().is_ok());
    assert!(right_neighbor.recv_timeout(Duration::from_secs(1)).unwrap().is_ok());
    assert_eq!(ring.snapshot().holders, vec![0, 2]);
}

#[test]
fn test_timeout_returns_false_and_holds_nothing() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(0).unwrap();

    let start = Instant::now();
    let acquired = ring.acquire_pair_timeout(1, Duration::from_millis(50)).unwrap();
    let elapsed = start.elapsed();

    assert!(!acquired);
    assert!(
        elapsed >= Duration::from_millis(50),
        "Should wait out the timeout, waited {:?}",
        elapsed
    );
    assert!(!ring.is_holding(1).unwrap());

    let snap = ring.snapshot();
    assert_eq!(snap.holders, vec![0]);
    assert!(snap.is_consistent());
}

#[test]
fn test_timeout_acquires_when_released_in_time() {
    let ring = Arc::new(ResourceRing::new(5).unwrap());
    ring.acquire_pair(0).unwrap();

    let releaser = {
        let ring = ring.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            ring.release_pair(0).unwrap();
        })
    };

    let acquired = ring.acquire_pair_timeout(1, Duration::from_secs(2)).unwrap();
    releaser.join().unwrap();

    assert!(acquired);
    assert!(ring.is_holding(1).unwrap());
}

#[test]
fn test_timeout_immediate_when_free() {
    let ring = ResourceRing::new(3).unwrap();
    assert!(ring.acquire_pair_timeout(2, Duration::ZERO).unwrap());
    assert_eq!(ring.pair(2).unwrap(), (2, 0));
}

#[test]
fn test_close_wakes_blocked_waiter() {
    let ring = Arc::new(ResourceRing::new(5).unwrap());
    ring.acquire_pair(0).unwrap();

    let waiting = spawn_acquire(&ring, 1);
    settle();

    ring.close();
    let result = waiting.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(result, Err(RingError::Closed));
    assert!(ring.is_closed());
}

#[test]
fn test_acquire_after_close_rejected_but_release_allowed() {
    let ring = ResourceRing::new(5).unwrap();
    ring.acquire_pair(3).unwrap();
    ring.close();

    assert_eq!(ring.acquire_pair(0).unwrap_err(), RingError::Closed);
    assert_eq!(ring.try_acquire_pair(0).unwrap_err(), RingError::Closed);
    assert_eq!(
        ring.acquire_pair_timeout(0, Duration::from_millis(10)).unwrap_err(),
        RingError::Closed
    );

    ring.release_pair(3).unwrap();
    assert_eq!(ring.snapshot().available, vec![true; 5]);
}

#[test]
fn test_close_is_idempotent() {
    let ring = ResourceRing::new(2).unwrap();
    ring.close();
    ring.close();
    assert!(ring.is_closed());
}

#[test]
fn test_observer_sees_events_in_order() {
    let log = EventLog::new();
    let ring = ResourceRing::with_observer(5, log.clone()).unwrap();

    ring.acquire_pair(4).unwrap();
    ring.release_pair(4).unwrap();
    let _ = ring.release_pair(4);

    assert_eq!(
        log.events(),
        vec![
            RingEvent::Acquired {
                agent: 4,
                right: 4,
                left: 0
            },
            RingEvent::Released {
                agent: 4,
                right: 4,
                left: 0
            },
        ]
    );
}

#[test]
fn test_failed_try_acquire_emits_nothing() {
    let log = EventLog::new();
    let ring = ResourceRing::with_observer(5, log.clone()).unwrap();

    ring.acquire_pair(0).unwrap();
    assert!(!ring.try_acquire_pair(1).unwrap());

    assert_eq!(log.len(), 1);
}

#[test]
fn test_panicking_observer_on_release_still_wakes_waiters() {
    let observer = Arc::new(PanickingObserver {
        on_acquire: false,
        on_release: true,
    });
    let ring = Arc::new(ResourceRing::with_observer(5, observer).unwrap());
    ring.acquire_pair(0).unwrap();

    let waiting = spawn_acquire(&ring, 1);
    settle();

    let result = panic::catch_unwind(AssertUnwindSafe(|| ring.release_pair(0)));
    assert!(result.is_err());

    let snap = ring.snapshot();
    assert!(!snap.holders.contains(&0));

    let woken = waiting.recv_timeout(Duration::from_secs(2));
    assert!(matches!(woken, Ok(Ok(()))), "agent 1 should wake, got {:?}", woken);
    assert!(ring.is_holding(1).unwrap());
}

#[test]
fn test_panicking_observer_on_acquire_leaves_pair_free() {
    let observer = Arc::new(PanickingObserver {
        on_acquire: true,
        on_release: true,
    });
    let ring = Arc::new(ResourceRing::with_observer(5, observer).unwrap());

    let acquirer = {
        let ring = ring.clone();
        thread::spawn(move || ring.acquire_pair(0))
    };
    assert!(acquirer.join().is_err());

    let snap = ring.snapshot();
    assert_eq!(snap.available, vec![true; 5]);
    assert!(snap.holders.is_empty());
    assert!(!ring.is_holding(0).unwrap());
}
