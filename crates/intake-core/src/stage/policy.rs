//! Policy stage (§4.6): account allowlist, profit gate, queue admission.
//!
//! Profit is computed in wei using arbitrary-precision signed integers
//! ([`alloy_primitives::I256`]) — floating point is disallowed here except
//! for `roi_bps`, which is itself an integer ratio in basis points.

use super::{StageOutcome, StageRejection};
use crate::reason::ReasonCode;
use alloy_primitives::{I256, U256};
use serde_json::json;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub allowed_accounts: Option<HashSet<String>>,
    pub queue_capacity: Option<i64>,
    pub profit_gate: Option<ProfitGateConfig>,
}

#[derive(Debug, Clone)]
pub struct ProfitGateConfig {
    pub min_profit_wei: U256,
    pub min_roi_bps: i64,
}

/// Decimal-string wei amounts, as carried on the wire (§4.6 Non-goals:
/// floating point is never used for money).
#[derive(Debug, Clone)]
pub struct ProfitCandidateInput<'a> {
    pub amount_in: &'a str,
    pub expected_out: &'a str,
    pub gas_estimate: &'a str,
    pub max_fee_per_gas: &'a str,
    pub max_priority_fee_per_gas: &'a str,
    pub flash_loan_used: bool,
    pub flash_premium_bps: u32,
    pub tip_wei: Option<&'a str>,
}

pub trait Queue: Send + Sync {
    fn enqueue(&self, intent_id: &str) -> Result<bool, String>;
}

/// Sink for the profit-gate audit trail (§4.6): every time the gate runs,
/// win or lose, one line is recorded here.
pub trait ProfitGateAuditSink {
    fn record(&mut self, intent_id: &str, audit: &ProfitGateAudit) -> Result<(), String>;
}

pub struct PolicyInput<'a> {
    pub from: Option<&'a str>,
    pub candidate: Option<ProfitCandidateInput<'a>>,
    pub intent_id: &'a str,
    pub queue: Option<&'a dyn Queue>,
    pub profit_gate_audit: Option<&'a mut dyn ProfitGateAuditSink>,
}

/// Diagnostic outcome of the profit-gate sub-check, logged to the audit
/// line regardless of pass/fail (§4.6).
#[derive(Debug, Clone)]
pub struct ProfitGateAudit {
    pub profit_wei: String,
    pub roi_bps: i64,
    pub passed: bool,
}

fn parse_wei(s: &str) -> Result<U256, StageRejection> {
    U256::from_str_radix(s, 10).map_err(|_| StageRejection::new(ReasonCode::InternalError))
}

fn to_signed(v: U256) -> Result<I256, StageRejection> {
    I256::try_from(v).map_err(|_| StageRejection::new(ReasonCode::InternalError))
}

fn evaluate_profit_gate(
    candidate: &ProfitCandidateInput<'_>,
    cfg: &ProfitGateConfig,
) -> Result<ProfitGateAudit, StageRejection> {
    let amount_in = parse_wei(candidate.amount_in)?;
    let expected_out = parse_wei(candidate.expected_out)?;
    let gas_estimate = parse_wei(candidate.gas_estimate)?;
    let max_fee = parse_wei(candidate.max_fee_per_gas)?;
    let max_priority_fee = parse_wei(candidate.max_priority_fee_per_gas)?;
    let tip = match candidate.tip_wei {
        Some(s) => parse_wei(s)?,
        None => U256::ZERO,
    };

    let gas_price = max_fee
        .checked_add(max_priority_fee)
        .ok_or_else(|| StageRejection::new(ReasonCode::InternalError))?;
    let gas_cost = gas_estimate
        .checked_mul(gas_price)
        .ok_or_else(|| StageRejection::new(ReasonCode::InternalError))?;

    let flash_premium = if candidate.flash_loan_used {
        amount_in
            .checked_mul(U256::from(candidate.flash_premium_bps))
            .and_then(|v| v.checked_div(U256::from(10_000u64)))
            .ok_or_else(|| StageRejection::new(ReasonCode::InternalError))?
    } else {
        U256::ZERO
    };

    let total_cost = amount_in
        .checked_add(gas_cost)
        .and_then(|v| v.checked_add(flash_premium))
        .and_then(|v| v.checked_add(tip))
        .ok_or_else(|| StageRejection::new(ReasonCode::InternalError))?;

    let profit = to_signed(expected_out)? - to_signed(total_cost)?;

    let roi_bps = if amount_in.is_zero() {
        0i64
    } else {
        let scaled = profit
            .checked_mul(I256::try_from(10_000u64).expect("10000 fits I256"))
            .ok_or_else(|| StageRejection::new(ReasonCode::InternalError))?;
        let amount_in_signed = to_signed(amount_in)?;
        let ratio = scaled
            .checked_div(amount_in_signed)
            .ok_or_else(|| StageRejection::new(ReasonCode::InternalError))?;
        i64::try_from(ratio).unwrap_or(i64::MIN)
    };

    let min_profit = to_signed(cfg.min_profit_wei)?;
    let passed = profit > min_profit && roi_bps >= cfg.min_roi_bps;

    Ok(ProfitGateAudit {
        profit_wei: profit.to_string(),
        roi_bps,
        passed,
    })
}

pub fn evaluate_policy(input: &mut PolicyInput<'_>, cfg: &PolicyConfig) -> StageOutcome {
    if let Some(allowed) = &cfg.allowed_accounts {
        if let Some(from) = input.from {
            if !allowed.contains(from) {
                return Err(StageRejection::with_context(
                    ReasonCode::PolicyAccountNotAllowed,
                    json!({ "from": from }),
                ));
            }
        }
    }

    if let (Some(candidate), Some(gate_cfg)) = (&input.candidate, &cfg.profit_gate) {
        let audit = evaluate_profit_gate(candidate, gate_cfg)?;
        if let Some(sink) = input.profit_gate_audit.as_mut() {
            let _ = sink.record(input.intent_id, &audit);
        }
        if !audit.passed {
            return Err(StageRejection::with_context(
                ReasonCode::PolicyFeeTooLow,
                json!({ "profit_wei": audit.profit_wei, "roi_bps": audit.roi_bps }),
            ));
        }
    }

    if let Some(queue) = input.queue {
        if let Some(capacity) = cfg.queue_capacity {
            if capacity <= 0 {
                return Err(StageRejection::new(ReasonCode::QueueCapacity));
            }
        }
        match queue.enqueue(input.intent_id) {
            Ok(true) => {}
            Ok(false) => return Err(StageRejection::new(ReasonCode::QueueCapacity)),
            Err(_) => return Err(StageRejection::new(ReasonCode::InternalError)),
        }
    }

    Ok(())
}
