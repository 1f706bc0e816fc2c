//! Intent state machine: legal transitions and the single-step executor
//! described in §4.1.
//!
//! The executor is generic over a [`TransitionStore`] so that `intake-core`
//! stays free of any concrete persistence choice; `intake-store` supplies
//! the implementation backing the in-memory intent store.

use crate::model::IntentState;

/// True if `from -> to` is a declared edge of the state graph.
pub fn is_legal_transition(from: IntentState, to: IntentState) -> bool {
    use IntentState::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Received, Screened)
            | (Received, Rejected)
            | (Screened, Validated)
            | (Screened, Rejected)
            | (Validated, Enriched)
            | (Validated, Rejected)
            | (Enriched, Queued)
            | (Enriched, Rejected)
            | (Queued, Submitted)
            | (Submitted, Included)
            | (Submitted, Dropped)
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// `from -> to` is not a declared edge, and `to` was not already
    /// observed on re-read.
    InvalidTransition { from: IntentState, to: IntentState },
    /// The intent is not known to the store.
    NotFound,
    /// The store failed to persist the transition.
    PersistFailed { reason: String },
}

/// Outcome of a single `advance` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The store's compare-and-set won the race; the new version is
    /// returned.
    Applied { version: u64 },
    /// A concurrent writer already advanced the record to `target`; the
    /// current call is treated as an idempotent no-op success (§4.1 tie-break
    /// rule).
    AlreadyAtTarget { version: u64 },
}

/// What the executor needs from a persistence layer. Implemented by
/// `intake-store`'s in-memory intent store.
pub trait TransitionStore {
    /// Current `(state, version)` for `intent_id`, or `None` if unknown.
    fn load_state(&self, intent_id: &str) -> Option<(IntentState, u64)>;

    /// Attempt to write `target` conditioned on `expected_version`.
    /// Returns `Ok(new_version)` on success, `Err(())` on a version
    /// mismatch (the caller re-reads via `load_state`).
    fn compare_and_set(
        &self,
        intent_id: &str,
        expected_version: u64,
        target: IntentState,
        reason_code: Option<&str>,
    ) -> Result<u64, ()>;
}

/// Execute one legal single-step transition, per the §4.1 contract:
/// idempotent on `target == current`, retries once on a lost CAS race by
/// re-reading the fresh state, and otherwise fails closed.
pub fn advance<S: TransitionStore + ?Sized>(
    store: &S,
    intent_id: &str,
    target: IntentState,
    reason_code: Option<&str>,
) -> Result<AdvanceOutcome, TransitionError> {
    let (current, version) = store.load_state(intent_id).ok_or(TransitionError::NotFound)?;

    if current == target {
        return Ok(AdvanceOutcome::AlreadyAtTarget { version });
    }

    if current.is_terminal() {
        return Err(TransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    if !is_legal_transition(current, target) {
        return Err(TransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    match store.compare_and_set(intent_id, version, target, reason_code) {
        Ok(new_version) => Ok(AdvanceOutcome::Applied {
            version: new_version,
        }),
        Err(()) => {
            // Lost the race; re-read and accept if someone else already
            // landed us on `target`.
            let (fresh_state, fresh_version) = store
                .load_state(intent_id)
                .ok_or(TransitionError::NotFound)?;
            if fresh_state == target {
                Ok(AdvanceOutcome::AlreadyAtTarget {
                    version: fresh_version,
                })
            } else {
                Err(TransitionError::InvalidTransition {
                    from: fresh_state,
                    to: target,
                })
            }
        }
    }
}
