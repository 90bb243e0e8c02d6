// ABOUTME: Tests for agent state values and the shared state cell.

use super::state::{AgentState, StateCell};

#[test]
fn test_cell_starts_idle() {
    assert_eq!(StateCell::new().get(), AgentState::Idle);
}

#[test]
fn test_clones_share_state() {
    let cell = StateCell::new();
    let view = cell.clone();

    cell.set(AgentState::Eating);
    assert_eq!(view.get(), AgentState::Eating);
}

#[test]
fn test_every_state_round_trips_through_cell() {
    let cell = StateCell::new();
    for state in [
        AgentState::Idle,
        AgentState::Thinking,
        AgentState::Waiting,
        AgentState::Eating,
        AgentState::Releasing,
        AgentState::Stopped,
    ] {
        cell.set(state);
        assert_eq!(cell.get(), state);
    }
}

#[test]
fn test_state_display() {
    assert_eq!(AgentState::Waiting.to_string(), "waiting");
    assert_eq!(AgentState::Releasing.to_string(), "releasing");
    assert_eq!(
        serde_json::to_string(&AgentState::Thinking).unwrap(),
        "\"thinking\""
    );
}
