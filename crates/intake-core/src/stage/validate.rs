//! Validate stage (§4.4): chain match, signature, gas bounds.

use super::{StageOutcome, StageRejection};
use crate::reason::ReasonCode;
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct ValidateConfig {
    pub chain_id: Option<String>,
    pub max_gas: Option<i64>,
}

/// Injected signature verification. Returning `Err` models the verifier
/// itself throwing, distinct from it returning a negative verdict.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, payload_signature: &str, from: Option<&str>) -> Result<bool, String>;
}

pub struct ValidateInput<'a> {
    pub target_chain: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub from: Option<&'a str>,
    pub gas_limit: Option<i64>,
    pub verifier: Option<&'a dyn SignatureVerifier>,
}

pub fn evaluate_validate(input: &ValidateInput<'_>, cfg: &ValidateConfig) -> StageOutcome {
    if let Some(expected) = &cfg.chain_id {
        if let Some(got) = input.target_chain {
            if got != expected {
                return Err(StageRejection::with_context(
                    ReasonCode::ValidationChainMismatch,
                    json!({ "expected": expected, "got": got }),
                ));
            }
        }
    }

    if let Some(sig) = input.signature {
        match input.verifier {
            None => return Err(StageRejection::new(ReasonCode::ValidationSignatureFail)),
            Some(verifier) => match verifier.verify(sig, input.from) {
                Ok(true) => {}
                Ok(false) => return Err(StageRejection::new(ReasonCode::ValidationSignatureFail)),
                Err(_) => return Err(StageRejection::new(ReasonCode::InternalError)),
            },
        }
    }

    if let (Some(gas), Some(max_gas)) = (input.gas_limit, cfg.max_gas) {
        if gas <= 0 || gas > max_gas {
            return Err(StageRejection::with_context(
                ReasonCode::ValidationGasBounds,
                json!({ "gas_limit": gas, "max_gas": max_gas }),
            ));
        }
    }

    Ok(())
}
