//! Integration tests for the intent state machine's `advance` executor.

use intake_core::model::IntentState;
use intake_core::state::{advance, AdvanceOutcome, TransitionError, TransitionStore};
use std::sync::Mutex;

struct FakeStore {
    state: Mutex<(IntentState, u64)>,
}

impl FakeStore {
    fn new(state: IntentState) -> Self {
        FakeStore {
            state: Mutex::new((state, 0)),
        }
    }
}

impl TransitionStore for FakeStore {
    fn load_state(&self, _intent_id: &str) -> Option<(IntentState, u64)> {
        Some(*self.state.lock().unwrap())
    }

    fn compare_and_set(
        &self,
        _intent_id: &str,
        expected_version: u64,
        target: IntentState,
        _reason_code: Option<&str>,
    ) -> Result<u64, ()> {
        let mut guard = self.state.lock().unwrap();
        if guard.1 != expected_version {
            return Err(());
        }
        guard.0 = target;
        guard.1 += 1;
        Ok(guard.1)
    }
}

#[test]
fn test_legal_transition_applies_and_bumps_version() {
    let store = FakeStore::new(IntentState::Received);
    let outcome = advance(&store, "i1", IntentState::Screened, None).unwrap();
    assert_eq!(outcome, AdvanceOutcome::Applied { version: 1 });
}

#[test]
fn test_same_state_advance_is_idempotent_noop() {
    let store = FakeStore::new(IntentState::Queued);
    let outcome = advance(&store, "i1", IntentState::Queued, None).unwrap();
    assert_eq!(outcome, AdvanceOutcome::AlreadyAtTarget { version: 0 });
}

#[test]
fn test_illegal_transition_is_rejected() {
    let store = FakeStore::new(IntentState::Received);
    let err = advance(&store, "i1", IntentState::Queued, None).unwrap_err();
    assert!(matches!(
        err,
        TransitionError::InvalidTransition {
            from: IntentState::Received,
            to: IntentState::Queued,
        }
    ));
}

#[test]
fn test_transition_out_of_a_terminal_state_is_rejected() {
    let store = FakeStore::new(IntentState::Rejected);
    let err = advance(&store, "i1", IntentState::Screened, None).unwrap_err();
    assert!(matches!(err, TransitionError::InvalidTransition { .. }));
}

#[test]
fn test_unknown_intent_id_is_not_found() {
    struct EmptyStore;
    impl TransitionStore for EmptyStore {
        fn load_state(&self, _intent_id: &str) -> Option<(IntentState, u64)> {
            None
        }
        fn compare_and_set(
            &self,
            _intent_id: &str,
            _expected_version: u64,
            _target: IntentState,
            _reason_code: Option<&str>,
        ) -> Result<u64, ()> {
            Err(())
        }
    }
    let err = advance(&EmptyStore, "ghost", IntentState::Screened, None).unwrap_err();
    assert_eq!(err, TransitionError::NotFound);
}

/// A store whose `compare_and_set` always loses the race but whose
/// `load_state` reports the caller's own target on re-read — the
/// concurrent-winner tie-break case from the transition contract.
struct RacingStore {
    state: Mutex<(IntentState, u64)>,
}

impl TransitionStore for RacingStore {
    fn load_state(&self, _intent_id: &str) -> Option<(IntentState, u64)> {
        Some(*self.state.lock().unwrap())
    }

    fn compare_and_set(
        &self,
        _intent_id: &str,
        _expected_version: u64,
        target: IntentState,
        _reason_code: Option<&str>,
    ) -> Result<u64, ()> {
        // Simulate another writer landing the same target just before us.
        let mut guard = self.state.lock().unwrap();
        guard.0 = target;
        guard.1 += 1;
        Err(())
    }
}

#[test]
fn test_lost_race_to_the_same_target_is_treated_as_success() {
    let store = RacingStore {
        state: Mutex::new((IntentState::Received, 0)),
    };
    let outcome = advance(&store, "i1", IntentState::Screened, None).unwrap();
    assert_eq!(outcome, AdvanceOutcome::AlreadyAtTarget { version: 1 });
}
