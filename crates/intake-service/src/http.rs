//! Thin HTTP surface (§4.10, §6): `POST /intent`, `GET /status/{intent_id}`,
//! `GET /health`.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use intake_core::idempotency::hash_payload;
use intake_core::model::{
    ErrorEnvelope, IntentAck, IntentPayload, IntentRecord, IntentState, IntentStatus, ReasonDetail,
};
use intake_core::pipeline::{run_pipeline, PipelineContext, PipelineDeps, PipelineOutcome};
use intake_core::reason::{self, ReasonCode};
use intake_core::stage::enrich::EnrichConfig;
use intake_core::stage::policy::{PolicyConfig, ProfitGateConfig};
use intake_core::stage::screen::ScreenConfig;
use intake_core::stage::validate::ValidateConfig;
use intake_store::health::check_health;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/intent", post(post_intent))
        .route("/status/:intent_id", get(get_status))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get("x-corr-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn now_ms() -> i64 {
    intake_store::clock::now_ms()
}

fn error_response(corr_id: String, request_hash: Option<String>, state: IntentState, reason: ReasonDetail) -> Response {
    let status = StatusCode::from_u16(reason.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = ErrorEnvelope {
        corr_id,
        request_hash,
        state,
        reason,
        ts: intake_store::clock::now_rfc3339(),
    };
    (status, Json(envelope)).into_response()
}

fn build_deps<'a>(
    app: &'a AppState,
) -> Result<(ScreenConfig, ValidateConfig, EnrichConfig, PolicyConfig), ReasonDetail> {
    let screen_cfg = ScreenConfig {
        max_bytes: app.config.limits.max_bytes,
    };
    let validate_cfg = ValidateConfig {
        chain_id: app.config.chain_id.clone(),
        max_gas: Some(app.config.limits.max_gas),
    };
    let enrich_cfg = EnrichConfig {
        fee_multiplier: Some(app.config.fee_multiplier),
    };
    let profit_gate = match app.config.profit_gate_settings() {
        None => None,
        Some(settings) => {
            let min_profit_wei = alloy_primitives_u256(&settings.min_profit_wei)
                .ok_or_else(|| reason::resolve(ReasonCode::InternalError, None))?;
            Some(ProfitGateConfig {
                min_profit_wei,
                min_roi_bps: settings.min_roi_bps,
            })
        }
    };
    let policy_cfg = PolicyConfig {
        allowed_accounts: app.config.policy.allowed_accounts.clone(),
        queue_capacity: Some(app.config.queue_capacity),
        profit_gate,
    };
    Ok((screen_cfg, validate_cfg, enrich_cfg, policy_cfg))
}

fn alloy_primitives_u256(s: &str) -> Option<alloy_primitives::U256> {
    alloy_primitives::U256::from_str_radix(s, 10).ok()
}

async fn post_intent(State(app): State<Arc<AppState>>, headers: HeaderMap, body: Json<Value>) -> Response {
    let corr_id = correlation_id(&headers);
    tracing::debug!(corr_id = %corr_id, "intent received");
    let now = now_ms();
    let raw = body.0;

    let payload: IntentPayload = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(_) => {
            return error_response(
                corr_id.clone(),
                None,
                IntentState::Rejected,
                reason::resolve(ReasonCode::ClientBadRequest, None),
            )
        }
    };

    let request_hash = hash_payload(&raw);
    let idempotency_key = headers.get("idempotency-key").and_then(|v| v.to_str().ok());
    let window_ms = app.config.idempotency_window_ms;

    if let Some(key) = idempotency_key {
        if let Some(existing) = app.store.get_by_idempotency_key_within(key, window_ms, now) {
            app.metrics.record_idempotency_hit();
            return (
                StatusCode::OK,
                Json(IntentAck {
                    intent_id: existing.intent_id,
                    state: existing.state,
                    correlation_id: existing.correlation_id,
                }),
            )
                .into_response();
        }
    }

    if let Some(existing) = app.store.get_by_hash_within(&request_hash, window_ms, now) {
        app.metrics.record_idempotency_hit();
        if existing.payload == payload {
            return (
                StatusCode::OK,
                Json(IntentAck {
                    intent_id: existing.intent_id,
                    state: existing.state,
                    correlation_id: existing.correlation_id,
                }),
            )
                .into_response();
        }
        return error_response(
            corr_id,
            Some(request_hash),
            IntentState::Rejected,
            reason::resolve(ReasonCode::ScreenReplaySeen, None),
        );
    }

    let intent_id = payload.intent_id.clone();
    if intent_id.is_empty() {
        return error_response(
            corr_id,
            Some(request_hash),
            IntentState::Rejected,
            reason::resolve(ReasonCode::ClientBadRequest, None),
        );
    }

    let mut record = IntentRecord {
        intent_id: intent_id.clone(),
        request_hash: request_hash.clone(),
        correlation_id: corr_id.clone(),
        state: IntentState::Received,
        reason_code: IntentRecord::OK_REASON.to_string(),
        version: 0,
        received_at_ms: now,
        payload,
    };
    record.payload.bytes.get_or_insert(raw.to_string().len() as u64);
    app.store.put(record.clone());
    if let Some(key) = idempotency_key {
        app.store.set_idempotency_key(key, &intent_id);
    }

    let (screen_cfg, validate_cfg, enrich_cfg, policy_cfg) = match build_deps(&app) {
        Ok(cfgs) => cfgs,
        Err(reason) => return error_response(corr_id, Some(request_hash), IntentState::Rejected, reason),
    };

    let deps = PipelineDeps {
        screen_cfg,
        validate_cfg,
        enrich_cfg,
        policy_cfg,
        rate_limiter: None,
        verifier: None,
        queue: None,
        edge_modules: &app.edge_modules,
        metrics: &app.metrics,
    };
    let ctx = PipelineContext {
        now_ms: now,
        already_seen: false,
        client_key: &intent_id,
    };

    let mut rejection_audit = app.rejection_audit.lock().expect("audit lock poisoned");
    let mut submit_guard_audit = app.submit_guard_audit.lock().expect("audit lock poisoned");
    let mut profit_gate_audit = app.profit_gate_audit.lock().expect("audit lock poisoned");
    let outcome = run_pipeline(
        &mut record,
        &ctx,
        &deps,
        &mut *rejection_audit,
        &mut *submit_guard_audit,
        &mut *profit_gate_audit,
    );
    drop(rejection_audit);
    drop(submit_guard_audit);
    drop(profit_gate_audit);

    app.store.put(record.clone());
    app.metrics.set_queue_depth(app.store.count_queued() as u64);

    match outcome {
        PipelineOutcome::Queued => (
            StatusCode::CREATED,
            Json(IntentAck {
                intent_id: record.intent_id,
                state: record.state,
                correlation_id: record.correlation_id,
            }),
        )
            .into_response(),
        PipelineOutcome::SubmitNotAttempted => (
            StatusCode::CREATED,
            Json(IntentAck {
                intent_id: record.intent_id,
                state: record.state,
                correlation_id: record.correlation_id,
            }),
        )
            .into_response(),
        PipelineOutcome::Rejected(detail) => {
            error_response(record.correlation_id, Some(record.request_hash), record.state, detail)
        }
    }
}

async fn get_status(State(app): State<Arc<AppState>>, headers: HeaderMap, Path(intent_id): Path<String>) -> Response {
    let corr_id = correlation_id(&headers);
    tracing::debug!(corr_id = %corr_id, intent_id = %intent_id, "status lookup");
    match app.store.get_by_id(&intent_id) {
        Some(record) => {
            let last_reason = if record.is_ok_reason() {
                None
            } else {
                reason::resolve_by_code(&record.reason_code)
            };
            (
                StatusCode::OK,
                Json(IntentStatus {
                    intent_id: record.intent_id,
                    state: record.state,
                    last_reason,
                }),
            )
                .into_response()
        }
        None => error_response(
            corr_id,
            None,
            IntentState::Rejected,
            reason::resolve(ReasonCode::ClientNotFound, None),
        ),
    }
}

async fn get_health(State(app): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(check_health(&app.build_id))).into_response()
}
