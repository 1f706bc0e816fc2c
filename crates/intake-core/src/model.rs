//! Core intent record and wire-level envelope types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of an intent. Legal single-step transitions are
/// enforced by [`crate::state`], not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentState {
    Received,
    Screened,
    Validated,
    Enriched,
    Queued,
    Submitted,
    Included,
    Dropped,
    Rejected,
}

impl IntentState {
    /// Terminal states accept no further transitions (I3).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            IntentState::Rejected | IntentState::Included | IntentState::Dropped
        )
    }
}

/// The client-submitted payload. Only the fields the pipeline inspects are
/// modeled explicitly; anything else travels in `extra` so canonical
/// hashing still covers the whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPayload {
    pub intent_id: String,
    pub target_chain: Option<String>,
    pub deadline_ms: Option<i64>,
    pub from: Option<String>,
    pub signature: Option<String>,
    pub gas_limit: Option<i64>,
    pub bytes: Option<u64>,
    pub candidate: Option<ProfitCandidate>,
    pub quote: Option<ProfitQuote>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Candidate-side inputs to the profit gate (§4.6). All monetary fields are
/// decimal strings so they can be parsed as arbitrary-precision integers
/// (wei) without floating-point loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitCandidate {
    pub amount_in: String,
    pub gas_estimate: String,
    pub max_fee_per_gas: String,
    pub max_priority_fee_per_gas: String,
    #[serde(default)]
    pub flash_loan_used: bool,
    #[serde(default)]
    pub flash_premium_bps: u32,
    #[serde(default)]
    pub tip_wei: Option<String>,
}

/// Quote-side inputs to the profit gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitQuote {
    pub expected_out: String,
}

/// The durable record the intent store holds for one intake request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub intent_id: String,
    pub request_hash: String,
    pub correlation_id: String,
    pub state: IntentState,
    pub reason_code: String,
    pub version: u64,
    pub received_at_ms: i64,
    pub payload: IntentPayload,
}

impl IntentRecord {
    pub const OK_REASON: &'static str = "ok";

    pub fn is_ok_reason(&self) -> bool {
        self.reason_code == Self::OK_REASON
    }
}

/// `{code, category, http_status, message, context?}` — the sole shape for
/// describing why a stage produced a non-success outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonDetail {
    pub code: String,
    pub category: String,
    pub http_status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// The sole failure-response shape (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub corr_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_hash: Option<String>,
    pub state: IntentState,
    pub reason: ReasonDetail,
    pub ts: String,
}

/// Success-shape response for `POST /intent` and idempotent replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAck {
    pub intent_id: String,
    pub state: IntentState,
    pub correlation_id: String,
}

/// Response body for `GET /status/{intent_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentStatus {
    pub intent_id: String,
    pub state: IntentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reason: Option<ReasonDetail>,
}
