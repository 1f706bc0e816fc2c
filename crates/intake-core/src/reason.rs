//! Reason registry: stable codes, categories, and HTTP status mapping.
//!
//! Removing or renumbering a code here is a breaking change (§3).

use crate::model::ReasonDetail;

/// Stable rejection/outcome codes. Every variant maps to exactly one entry
/// in [`REGISTRY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    ClientBadRequest,
    ClientDuplicate,
    ClientExpired,
    ClientNotFound,
    ScreenTooLarge,
    ScreenRateLimit,
    ScreenReplaySeen,
    ValidationSchemaFail,
    ValidationChainMismatch,
    ValidationSignatureFail,
    ValidationGasBounds,
    PolicyAccountNotAllowed,
    PolicyFeeTooLow,
    QueueCapacity,
    SubmitNotAttempted,
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCategory {
    Client,
    Screen,
    Validation,
    Policy,
    Queue,
    Submit,
    Internal,
}

impl ReasonCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCategory::Client => "CLIENT",
            ReasonCategory::Screen => "SCREEN",
            ReasonCategory::Validation => "VALIDATION",
            ReasonCategory::Policy => "POLICY",
            ReasonCategory::Queue => "QUEUE",
            ReasonCategory::Submit => "SUBMIT",
            ReasonCategory::Internal => "INTERNAL",
        }
    }
}

struct RegistryEntry {
    code: ReasonCode,
    category: ReasonCategory,
    http_status: u16,
    message: &'static str,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::ClientBadRequest => "CLIENT_BAD_REQUEST",
            ReasonCode::ClientDuplicate => "CLIENT_DUPLICATE",
            ReasonCode::ClientExpired => "CLIENT_EXPIRED",
            ReasonCode::ClientNotFound => "CLIENT_NOT_FOUND",
            ReasonCode::ScreenTooLarge => "SCREEN_TOO_LARGE",
            ReasonCode::ScreenRateLimit => "SCREEN_RATE_LIMIT",
            ReasonCode::ScreenReplaySeen => "SCREEN_REPLAY_SEEN",
            ReasonCode::ValidationSchemaFail => "VALIDATION_SCHEMA_FAIL",
            ReasonCode::ValidationChainMismatch => "VALIDATION_CHAIN_MISMATCH",
            ReasonCode::ValidationSignatureFail => "VALIDATION_SIGNATURE_FAIL",
            ReasonCode::ValidationGasBounds => "VALIDATION_GAS_BOUNDS",
            ReasonCode::PolicyAccountNotAllowed => "POLICY_ACCOUNT_NOT_ALLOWED",
            ReasonCode::PolicyFeeTooLow => "POLICY_FEE_TOO_LOW",
            ReasonCode::QueueCapacity => "QUEUE_CAPACITY",
            ReasonCode::SubmitNotAttempted => "SUBMIT_NOT_ATTEMPTED",
            ReasonCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        code: ReasonCode::ClientBadRequest,
        category: ReasonCategory::Client,
        http_status: 400,
        message: "request missing or malformed fields",
    },
    RegistryEntry {
        code: ReasonCode::ClientDuplicate,
        category: ReasonCategory::Client,
        http_status: 200,
        message: "idempotent replay of a prior request",
    },
    RegistryEntry {
        code: ReasonCode::ClientExpired,
        category: ReasonCategory::Client,
        http_status: 400,
        message: "deadline has already passed",
    },
    RegistryEntry {
        code: ReasonCode::ClientNotFound,
        category: ReasonCategory::Client,
        http_status: 404,
        message: "unknown intent_id",
    },
    RegistryEntry {
        code: ReasonCode::ScreenTooLarge,
        category: ReasonCategory::Screen,
        http_status: 413,
        message: "payload exceeds the configured size limit",
    },
    RegistryEntry {
        code: ReasonCode::ScreenRateLimit,
        category: ReasonCategory::Screen,
        http_status: 429,
        message: "request throttled by the rate limiter",
    },
    RegistryEntry {
        code: ReasonCode::ScreenReplaySeen,
        category: ReasonCategory::Screen,
        http_status: 200,
        message: "request hash already seen",
    },
    RegistryEntry {
        code: ReasonCode::ValidationSchemaFail,
        category: ReasonCategory::Validation,
        http_status: 400,
        message: "payload failed schema validation",
    },
    RegistryEntry {
        code: ReasonCode::ValidationChainMismatch,
        category: ReasonCategory::Validation,
        http_status: 400,
        message: "target_chain does not match the configured chain",
    },
    RegistryEntry {
        code: ReasonCode::ValidationSignatureFail,
        category: ReasonCategory::Validation,
        http_status: 401,
        message: "signature missing, unverifiable, or invalid",
    },
    RegistryEntry {
        code: ReasonCode::ValidationGasBounds,
        category: ReasonCategory::Validation,
        http_status: 400,
        message: "gas_limit is out of the configured bounds",
    },
    RegistryEntry {
        code: ReasonCode::PolicyAccountNotAllowed,
        category: ReasonCategory::Policy,
        http_status: 403,
        message: "from account is not on the allowlist",
    },
    RegistryEntry {
        code: ReasonCode::PolicyFeeTooLow,
        category: ReasonCategory::Policy,
        http_status: 400,
        message: "expected profit does not clear the profit gate",
    },
    RegistryEntry {
        code: ReasonCode::QueueCapacity,
        category: ReasonCategory::Queue,
        http_status: 503,
        message: "queue is at capacity",
    },
    RegistryEntry {
        code: ReasonCode::SubmitNotAttempted,
        category: ReasonCategory::Submit,
        http_status: 202,
        message: "no private submission module loaded; submission skipped",
    },
    RegistryEntry {
        code: ReasonCode::InternalError,
        category: ReasonCategory::Internal,
        http_status: 500,
        message: "unexpected internal error",
    },
];

fn entry_for(code: ReasonCode) -> &'static RegistryEntry {
    REGISTRY
        .iter()
        .find(|e| e.code == code)
        .expect("every ReasonCode variant has a REGISTRY entry")
}

/// Resolve a code to its full detail, with optional context attached.
pub fn resolve(code: ReasonCode, context: Option<serde_json::Value>) -> ReasonDetail {
    let entry = entry_for(code);
    ReasonDetail {
        code: entry.code.as_str().to_string(),
        category: entry.category.as_str().to_string(),
        http_status: entry.http_status,
        message: entry.message.to_string(),
        context,
    }
}

pub fn reason_registry() -> impl Iterator<Item = ReasonCode> {
    REGISTRY.iter().map(|e| e.code)
}

pub fn http_status_for(code: ReasonCode) -> u16 {
    entry_for(code).http_status
}

/// Resolve a persisted `reason_code` string (as stored on an `IntentRecord`)
/// back to its full detail, e.g. for `GET /status/{intent_id}`.
pub fn resolve_by_code(code_str: &str) -> Option<ReasonDetail> {
    REGISTRY.iter().find(|e| e.code.as_str() == code_str).map(|entry| ReasonDetail {
        code: entry.code.as_str().to_string(),
        category: entry.category.as_str().to_string(),
        http_status: entry.http_status,
        message: entry.message.to_string(),
        context: None,
    })
}
