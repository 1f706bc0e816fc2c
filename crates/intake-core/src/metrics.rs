//! Stage and decision metrics (§4.9): counters and latency samples,
//! collected independent of any particular metrics backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counters and latency samples for one pipeline runner. Safe to share
/// behind an `Arc` across concurrently-served intents.
#[derive(Default)]
pub struct PipelineMetrics {
    intents_by_decision: Mutex<HashMap<String, u64>>,
    rejects_by_reason: Mutex<HashMap<String, u64>>,
    stage_latency_ms: Mutex<HashMap<String, Vec<f64>>>,
    decision_latency_ms: Mutex<Vec<f64>>,
    idempotency_hits: AtomicU64,
    queue_depth: AtomicU64,
    in_flight_by_client: Mutex<HashMap<String, u64>>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_decision(&self, decision: &str) {
        let mut map = self.intents_by_decision.lock().expect("metrics lock poisoned");
        *map.entry(decision.to_string()).or_insert(0) += 1;
    }

    pub fn record_reject(&self, reason_code: &str) {
        let mut map = self.rejects_by_reason.lock().expect("metrics lock poisoned");
        *map.entry(reason_code.to_string()).or_insert(0) += 1;
    }

    pub fn record_stage_latency(&self, stage: &str, millis: f64) {
        let mut map = self.stage_latency_ms.lock().expect("metrics lock poisoned");
        map.entry(stage.to_string()).or_default().push(millis);
    }

    pub fn record_decision_latency(&self, millis: f64) {
        self.decision_latency_ms
            .lock()
            .expect("metrics lock poisoned")
            .push(millis);
    }

    pub fn record_idempotency_hit(&self) {
        self.idempotency_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    /// Marks one intent as in-flight for `client_key`. Paired with
    /// [`Self::mark_in_flight_end`] around the pipeline run.
    pub fn mark_in_flight_start(&self, client_key: &str) {
        let mut map = self.in_flight_by_client.lock().expect("metrics lock poisoned");
        *map.entry(client_key.to_string()).or_insert(0) += 1;
    }

    /// Clears one in-flight slot for `client_key`, dropping the entry once
    /// it reaches zero so the map doesn't grow unbounded with stale keys.
    pub fn mark_in_flight_end(&self, client_key: &str) {
        let mut map = self.in_flight_by_client.lock().expect("metrics lock poisoned");
        if let Some(count) = map.get_mut(client_key) {
            if *count <= 1 {
                map.remove(client_key);
            } else {
                *count -= 1;
            }
        }
    }

    pub fn decisions_total(&self, decision: &str) -> u64 {
        self.intents_by_decision
            .lock()
            .expect("metrics lock poisoned")
            .get(decision)
            .copied()
            .unwrap_or(0)
    }

    pub fn rejects_total(&self, reason_code: &str) -> u64 {
        self.rejects_by_reason
            .lock()
            .expect("metrics lock poisoned")
            .get(reason_code)
            .copied()
            .unwrap_or(0)
    }

    pub fn stage_sample_count(&self, stage: &str) -> usize {
        self.stage_latency_ms
            .lock()
            .expect("metrics lock poisoned")
            .get(stage)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn idempotency_hits_total(&self) -> u64 {
        self.idempotency_hits.load(Ordering::Relaxed)
    }

    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self, client_key: &str) -> u64 {
        self.in_flight_by_client
            .lock()
            .expect("metrics lock poisoned")
            .get(client_key)
            .copied()
            .unwrap_or(0)
    }

    pub fn in_flight_total(&self) -> u64 {
        self.in_flight_by_client.lock().expect("metrics lock poisoned").values().sum()
    }
}
