//! The intent store (§4.8): by-id, by-hash, and by-idempotency-key
//! lookup over a bounded freshness window, with lazy expiry on read —
//! the same TTL-on-read discipline a venue instrument cache would use for
//! freshness checks.

use intake_core::model::IntentRecord;
use intake_core::state::TransitionStore;
use std::collections::HashMap;
use std::sync::Mutex;

struct Inner {
    by_id: HashMap<String, IntentRecord>,
    by_hash: HashMap<String, String>,
    by_idempotency_key: HashMap<String, String>,
}

/// Thread-safe in-memory intent store. A single mutex guards all three
/// indices so `put` stays atomic across them (§5 shared-resource policy).
pub struct IntentStore {
    inner: Mutex<Inner>,
}

impl IntentStore {
    pub fn new() -> Self {
        IntentStore {
            inner: Mutex::new(Inner {
                by_id: HashMap::new(),
                by_hash: HashMap::new(),
                by_idempotency_key: HashMap::new(),
            }),
        }
    }

    pub fn get_by_id(&self, intent_id: &str) -> Option<IntentRecord> {
        self.inner.lock().expect("store lock poisoned").by_id.get(intent_id).cloned()
    }

    /// Fresh record for `request_hash`, or `None` if absent or past the
    /// freshness window.
    pub fn get_by_hash_within(&self, request_hash: &str, window_ms: i64, now_ms: i64) -> Option<IntentRecord> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let intent_id = inner.by_hash.get(request_hash)?;
        let record = inner.by_id.get(intent_id)?;
        if now_ms - record.received_at_ms <= window_ms {
            Some(record.clone())
        } else {
            None
        }
    }

    /// Fresh record for an `idempotency_key`.
    pub fn get_by_idempotency_key_within(
        &self,
        idempotency_key: &str,
        window_ms: i64,
        now_ms: i64,
    ) -> Option<IntentRecord> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let intent_id = inner.by_idempotency_key.get(idempotency_key)?;
        let record = inner.by_id.get(intent_id)?;
        if now_ms - record.received_at_ms <= window_ms {
            Some(record.clone())
        } else {
            None
        }
    }

    /// Insert or fully replace a record, keeping the by-hash index in
    /// sync. A single critical section, per §5.
    pub fn put(&self, record: IntentRecord) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.by_hash.insert(record.request_hash.clone(), record.intent_id.clone());
        inner.by_id.insert(record.intent_id.clone(), record);
    }

    pub fn set_idempotency_key(&self, idempotency_key: &str, intent_id: &str) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .by_idempotency_key
            .insert(idempotency_key.to_string(), intent_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of intents currently sitting at `QUEUED` — the backpressure
    /// signal behind the `queue_depth` gauge (§4.9).
    pub fn count_queued(&self) -> usize {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .by_id
            .values()
            .filter(|r| r.state == intake_core::model::IntentState::Queued)
            .count()
    }
}

impl Default for IntentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionStore for IntentStore {
    fn load_state(&self, intent_id: &str) -> Option<(intake_core::model::IntentState, u64)> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.by_id.get(intent_id).map(|r| (r.state, r.version))
    }

    fn compare_and_set(
        &self,
        intent_id: &str,
        expected_version: u64,
        target: intake_core::model::IntentState,
        reason_code: Option<&str>,
    ) -> Result<u64, ()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let record = inner.by_id.get_mut(intent_id).ok_or(())?;
        if record.version != expected_version {
            tracing::debug!(intent_id, expected_version, actual_version = record.version, "compare-and-set lost the race");
            return Err(());
        }
        record.state = target;
        record.version += 1;
        if let Some(reason) = reason_code {
            record.reason_code = reason.to_string();
        }
        Ok(record.version)
    }
}
