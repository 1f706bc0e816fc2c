//! The four ordered admission stages (§4.3-§4.6), each a pure decision
//! function following the same `Input -> Outcome` shape.

pub mod enrich;
pub mod policy;
pub mod screen;
pub mod validate;

use crate::reason::ReasonCode;
use serde_json::Value;

/// A reasoned rejection raised by a stage: a stable code plus optional
/// diagnostic context (§3 Reason detail).
#[derive(Debug, Clone, PartialEq)]
pub struct StageRejection {
    pub code: ReasonCode,
    pub context: Option<Value>,
}

impl StageRejection {
    pub fn new(code: ReasonCode) -> Self {
        StageRejection { code, context: None }
    }

    pub fn with_context(code: ReasonCode, context: Value) -> Self {
        StageRejection {
            code,
            context: Some(context),
        }
    }
}

/// A stage either clears (the runner advances to the stage's declared next
/// state) or raises a [`StageRejection`] (the runner advances to REJECTED).
pub type StageOutcome = Result<(), StageRejection>;
