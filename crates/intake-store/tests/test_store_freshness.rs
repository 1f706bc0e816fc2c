//! Integration tests for the intent store's freshness-windowed lookups and
//! its `TransitionStore` implementation (§4.8, §4.1).

use intake_core::model::{IntentPayload, IntentRecord, IntentState};
use intake_core::state::{advance, TransitionError};
use intake_store::store::IntentStore;
use std::collections::BTreeMap;

fn sample(intent_id: &str, hash: &str, received_at_ms: i64) -> IntentRecord {
    IntentRecord {
        intent_id: intent_id.to_string(),
        request_hash: hash.to_string(),
        correlation_id: "corr".to_string(),
        state: IntentState::Received,
        reason_code: IntentRecord::OK_REASON.to_string(),
        version: 0,
        received_at_ms,
        payload: IntentPayload {
            intent_id: intent_id.to_string(),
            target_chain: None,
            deadline_ms: None,
            from: None,
            signature: None,
            gas_limit: None,
            bytes: None,
            candidate: None,
            quote: None,
            extra: BTreeMap::new(),
        },
    }
}

#[test]
fn test_idempotency_key_lookup_respects_the_freshness_window() {
    let store = IntentStore::new();
    store.put(sample("a", "hash-1", 1_000));
    store.set_idempotency_key("client-key-1", "a");

    assert!(store.get_by_idempotency_key_within("client-key-1", 60_000, 1_500).is_some());
    assert!(store.get_by_idempotency_key_within("client-key-1", 60_000, 200_000).is_none());
}

#[test]
fn test_store_drives_advance_through_a_full_lifecycle() {
    let store = IntentStore::new();
    store.put(sample("a", "hash-1", 1_000));

    advance(&store, "a", IntentState::Screened, None).unwrap();
    advance(&store, "a", IntentState::Validated, None).unwrap();
    advance(&store, "a", IntentState::Enriched, None).unwrap();
    advance(&store, "a", IntentState::Queued, None).unwrap();
    advance(&store, "a", IntentState::Submitted, None).unwrap();
    advance(&store, "a", IntentState::Included, None).unwrap();

    let record = store.get_by_id("a").unwrap();
    assert_eq!(record.state, IntentState::Included);
    assert_eq!(record.version, 6);
}

#[test]
fn test_advance_out_of_included_is_rejected_by_the_store() {
    let store = IntentStore::new();
    store.put(sample("a", "hash-1", 1_000));
    advance(&store, "a", IntentState::Screened, None).unwrap();
    advance(&store, "a", IntentState::Validated, None).unwrap();
    advance(&store, "a", IntentState::Enriched, None).unwrap();
    advance(&store, "a", IntentState::Queued, None).unwrap();
    advance(&store, "a", IntentState::Submitted, None).unwrap();
    advance(&store, "a", IntentState::Included, None).unwrap();

    let err = advance(&store, "a", IntentState::Dropped, None).unwrap_err();
    assert!(matches!(err, TransitionError::InvalidTransition { .. }));
}

#[test]
fn test_put_replaces_the_hash_index_for_a_resubmitted_record() {
    let store = IntentStore::new();
    store.put(sample("a", "hash-1", 1_000));
    store.put(sample("a", "hash-2", 1_200));

    assert!(store.get_by_hash_within("hash-2", 60_000, 1_300).is_some());
    assert_eq!(store.len(), 1);
}
