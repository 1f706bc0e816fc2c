//! Pipeline runner (§4.2): drives one intent sequentially through
//! Screen -> Validate -> Enrich -> Policy, fail-fast, then the submit guard.

use crate::edge::{submit_guard, EdgeModules, SubmitGuardOutcome};
use crate::metrics::PipelineMetrics;
use crate::model::{IntentRecord, IntentState, ReasonDetail};
use crate::reason;
use crate::stage::enrich::{evaluate_enrich, EnrichConfig, EnrichInput};
use crate::stage::policy::{
    evaluate_policy, PolicyConfig, PolicyInput, ProfitCandidateInput, ProfitGateAuditSink, Queue,
};
use crate::stage::screen::{evaluate_screen, RateLimiter, ScreenConfig, ScreenInput};
use crate::stage::validate::{evaluate_validate, SignatureVerifier, ValidateConfig, ValidateInput};
use crate::stage::StageRejection;
use crate::state::is_legal_transition;
use std::time::Instant;

pub struct PipelineDeps<'a> {
    pub screen_cfg: ScreenConfig,
    pub validate_cfg: ValidateConfig,
    pub enrich_cfg: EnrichConfig,
    pub policy_cfg: PolicyConfig,
    pub rate_limiter: Option<&'a dyn RateLimiter>,
    pub verifier: Option<&'a dyn SignatureVerifier>,
    pub queue: Option<&'a dyn Queue>,
    pub edge_modules: &'a EdgeModules,
    pub metrics: &'a PipelineMetrics,
}

pub struct PipelineContext<'a> {
    pub now_ms: i64,
    pub already_seen: bool,
    pub client_key: &'a str,
}

/// Sink for the `rejections.jsonl` audit trail (§4.9). Implemented by
/// `intake-store`.
pub trait RejectionAudit {
    fn record_rejection(
        &mut self,
        corr_id: &str,
        intent_id: &str,
        stage: &str,
        reason: &ReasonDetail,
    ) -> Result<(), String>;
}

/// Sink for the `submission-guard.jsonl` audit trail (§4.7).
pub trait SubmitGuardAudit {
    fn record_not_attempted(&mut self, corr_id: &str, intent_id: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Reached QUEUED and a real assembler is loaded; submission handoff
    /// proceeds outside the core.
    Queued,
    /// Reached QUEUED but the assembler is the NOOP default; the intent
    /// stays at QUEUED and no envelope is produced (2xx ack only).
    SubmitNotAttempted,
    /// A stage raised a reasoned rejection, or an unexpected fault
    /// occurred; the intent is REJECTED.
    Rejected(ReasonDetail),
}

/// Apply one local, sequential transition to `record`. Used by the runner,
/// which owns exclusive access to `record` for the duration of one
/// request. External, concurrent transitions (e.g. a later SUBMITTED ->
/// INCLUDED callback) go through [`crate::state::advance`] instead.
fn apply_transition(record: &mut IntentRecord, target: IntentState, reason_code: &str) {
    debug_assert!(
        record.state == target || is_legal_transition(record.state, target),
        "pipeline attempted an illegal transition {:?} -> {:?}",
        record.state,
        target
    );
    record.state = target;
    record.version += 1;
    record.reason_code = reason_code.to_string();
}

fn reject(
    record: &mut IntentRecord,
    stage: &str,
    rejection: StageRejection,
    deps: &PipelineDeps<'_>,
    audit: &mut dyn RejectionAudit,
) -> PipelineOutcome {
    let detail = reason::resolve(rejection.code, rejection.context);
    apply_transition(record, IntentState::Rejected, &detail.code);
    deps.metrics.record_reject(&detail.code);
    deps.metrics.record_decision("rejected");
    deps.metrics.mark_in_flight_end(&record.intent_id);
    tracing::warn!(
        corr_id = %record.correlation_id,
        intent_id = %record.intent_id,
        stage,
        reason_code = %detail.code,
        "intent rejected"
    );
    let _ = audit.record_rejection(&record.correlation_id, &record.intent_id, stage, &detail);
    PipelineOutcome::Rejected(detail)
}

pub fn run_pipeline(
    record: &mut IntentRecord,
    ctx: &PipelineContext<'_>,
    deps: &PipelineDeps<'_>,
    audit: &mut dyn RejectionAudit,
    submit_audit: &mut dyn SubmitGuardAudit,
    profit_gate_audit: &mut dyn ProfitGateAuditSink,
) -> PipelineOutcome {
    let pipeline_start = Instant::now();
    deps.metrics.mark_in_flight_start(&record.intent_id);

    // -- Screen --
    let stage_start = Instant::now();
    let screen_input = ScreenInput {
        payload_bytes: record.payload.bytes.unwrap_or(0),
        already_seen: ctx.already_seen,
        deadline_ms: record.payload.deadline_ms,
        now_ms: ctx.now_ms,
        client_key: ctx.client_key,
        rate_limiter: deps.rate_limiter,
    };
    let screen_result = evaluate_screen(&screen_input, &deps.screen_cfg);
    deps.metrics
        .record_stage_latency("screen", stage_start.elapsed().as_secs_f64() * 1000.0);
    match screen_result {
        Ok(()) => apply_transition(record, IntentState::Screened, IntentRecord::OK_REASON),
        Err(rejection) => return reject(record, "screen", rejection, deps, audit),
    }

    // -- Validate --
    let stage_start = Instant::now();
    let validate_input = ValidateInput {
        target_chain: record.payload.target_chain.as_deref(),
        signature: record.payload.signature.as_deref(),
        from: record.payload.from.as_deref(),
        gas_limit: record.payload.gas_limit,
        verifier: deps.verifier,
    };
    let validate_result = evaluate_validate(&validate_input, &deps.validate_cfg);
    deps.metrics
        .record_stage_latency("validate", stage_start.elapsed().as_secs_f64() * 1000.0);
    match validate_result {
        Ok(()) => apply_transition(record, IntentState::Validated, IntentRecord::OK_REASON),
        Err(rejection) => return reject(record, "validate", rejection, deps, audit),
    }

    // -- Enrich --
    let stage_start = Instant::now();
    let enrich_input = EnrichInput {
        from: record.payload.from.as_deref(),
        gas_limit: record.payload.gas_limit,
    };
    let enriched = evaluate_enrich(&enrich_input, &deps.enrich_cfg);
    deps.metrics
        .record_stage_latency("enrich", stage_start.elapsed().as_secs_f64() * 1000.0);
    if let Some(normalized) = enriched.from_normalized {
        record.payload.from = Some(normalized);
    }
    apply_transition(record, IntentState::Enriched, IntentRecord::OK_REASON);

    // -- Policy --
    let stage_start = Instant::now();
    let candidate_input = record
        .payload
        .candidate
        .as_ref()
        .zip(record.payload.quote.as_ref())
        .map(|(candidate, quote)| ProfitCandidateInput {
            amount_in: candidate.amount_in.as_str(),
            expected_out: quote.expected_out.as_str(),
            gas_estimate: candidate.gas_estimate.as_str(),
            max_fee_per_gas: candidate.max_fee_per_gas.as_str(),
            max_priority_fee_per_gas: candidate.max_priority_fee_per_gas.as_str(),
            flash_loan_used: candidate.flash_loan_used,
            flash_premium_bps: candidate.flash_premium_bps,
            tip_wei: candidate.tip_wei.as_deref(),
        });
    let mut policy_input = PolicyInput {
        from: record.payload.from.as_deref(),
        candidate: candidate_input,
        intent_id: &record.intent_id,
        queue: deps.queue,
        profit_gate_audit: Some(profit_gate_audit),
    };
    let policy_result = evaluate_policy(&mut policy_input, &deps.policy_cfg);
    deps.metrics
        .record_stage_latency("policy", stage_start.elapsed().as_secs_f64() * 1000.0);
    match policy_result {
        Ok(()) => apply_transition(record, IntentState::Queued, IntentRecord::OK_REASON),
        Err(rejection) => return reject(record, "policy", rejection, deps, audit),
    }

    deps.metrics
        .record_decision_latency(pipeline_start.elapsed().as_secs_f64() * 1000.0);

    // -- Submit guard --
    let outcome = match submit_guard(deps.edge_modules) {
        SubmitGuardOutcome::Proceed => {
            deps.metrics.record_decision("queued");
            tracing::info!(corr_id = %record.correlation_id, intent_id = %record.intent_id, "intent queued");
            PipelineOutcome::Queued
        }
        SubmitGuardOutcome::NotAttempted => {
            let _ = submit_audit.record_not_attempted(&record.correlation_id, &record.intent_id);
            deps.metrics.record_decision("submit_not_attempted");
            tracing::debug!(corr_id = %record.correlation_id, intent_id = %record.intent_id, "submission skipped, no assembler loaded");
            PipelineOutcome::SubmitNotAttempted
        }
    };
    deps.metrics.mark_in_flight_end(&record.intent_id);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeModules;
    use crate::model::IntentPayload;
    use std::collections::BTreeMap;

    fn record(intent_id: &str) -> IntentRecord {
        IntentRecord {
            intent_id: intent_id.to_string(),
            request_hash: "deadbeef".to_string(),
            correlation_id: "corr-1".to_string(),
            state: IntentState::Received,
            reason_code: IntentRecord::OK_REASON.to_string(),
            version: 0,
            received_at_ms: 0,
            payload: IntentPayload {
                intent_id: intent_id.to_string(),
                target_chain: None,
                deadline_ms: None,
                from: None,
                signature: None,
                gas_limit: None,
                bytes: Some(10),
                candidate: None,
                quote: None,
                extra: BTreeMap::new(),
            },
        }
    }

    struct NoopAudit;
    impl RejectionAudit for NoopAudit {
        fn record_rejection(
            &mut self,
            _corr_id: &str,
            _intent_id: &str,
            _stage: &str,
            _reason: &ReasonDetail,
        ) -> Result<(), String> {
            Ok(())
        }
    }
    impl SubmitGuardAudit for NoopAudit {
        fn record_not_attempted(&mut self, _corr_id: &str, _intent_id: &str) -> Result<(), String> {
            Ok(())
        }
    }
    impl crate::stage::policy::ProfitGateAuditSink for NoopAudit {
        fn record(&mut self, _intent_id: &str, _audit: &crate::stage::policy::ProfitGateAudit) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn happy_path_reaches_submit_not_attempted_with_noop_edge_modules() {
        let mut rec = record("a");
        let modules = EdgeModules::noop();
        let metrics = PipelineMetrics::new();
        let deps = PipelineDeps {
            screen_cfg: ScreenConfig { max_bytes: 1_000 },
            validate_cfg: ValidateConfig::default(),
            enrich_cfg: EnrichConfig::default(),
            policy_cfg: PolicyConfig::default(),
            rate_limiter: None,
            verifier: None,
            queue: None,
            edge_modules: &modules,
            metrics: &metrics,
        };
        let ctx = PipelineContext {
            now_ms: 1_000,
            already_seen: false,
            client_key: "client-a",
        };
        let mut audit = NoopAudit;
        let mut submit_audit = NoopAudit;
        let mut profit_gate_audit = NoopAudit;
        let outcome = run_pipeline(&mut rec, &ctx, &deps, &mut audit, &mut submit_audit, &mut profit_gate_audit);
        assert_eq!(outcome, PipelineOutcome::SubmitNotAttempted);
        assert_eq!(rec.state, IntentState::Queued);
        assert_eq!(rec.version, 4);
        assert_eq!(metrics.stage_sample_count("screen"), 1);
        assert_eq!(metrics.stage_sample_count("validate"), 1);
        assert_eq!(metrics.stage_sample_count("enrich"), 1);
        assert_eq!(metrics.stage_sample_count("policy"), 1);
    }

    #[test]
    fn oversized_payload_rejects_at_screen_and_stops_the_pipeline() {
        let mut rec = record("a");
        rec.payload.bytes = Some(10_000);
        let modules = EdgeModules::noop();
        let metrics = PipelineMetrics::new();
        let deps = PipelineDeps {
            screen_cfg: ScreenConfig { max_bytes: 1_000 },
            validate_cfg: ValidateConfig::default(),
            enrich_cfg: EnrichConfig::default(),
            policy_cfg: PolicyConfig::default(),
            rate_limiter: None,
            verifier: None,
            queue: None,
            edge_modules: &modules,
            metrics: &metrics,
        };
        let ctx = PipelineContext {
            now_ms: 1_000,
            already_seen: false,
            client_key: "client-a",
        };
        let mut audit = NoopAudit;
        let mut submit_audit = NoopAudit;
        let mut profit_gate_audit = NoopAudit;
        let outcome = run_pipeline(&mut rec, &ctx, &deps, &mut audit, &mut submit_audit, &mut profit_gate_audit);
        assert!(matches!(outcome, PipelineOutcome::Rejected(_)));
        assert_eq!(rec.state, IntentState::Rejected);
        assert_eq!(metrics.stage_sample_count("validate"), 0);
    }
}
