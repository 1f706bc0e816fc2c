//! Health endpoint implementation.
//!
//! Returns minimal health information: `ok`, `build_id`, `contract_version`.

use serde::{Deserialize, Serialize};

/// Version of the intake contract (request/response shapes and reason
/// codes) this build speaks.
pub const CONTRACT_VERSION: &str = "1.0";

/// Health response for `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// True when the process is up and healthy.
    pub ok: bool,
    /// Git commit SHA or build identifier.
    pub build_id: String,
    /// Contract version (e.g., "1.0").
    pub contract_version: String,
}

impl HealthResponse {
    pub fn healthy(build_id: impl Into<String>) -> Self {
        Self {
            ok: true,
            build_id: build_id.into(),
            contract_version: CONTRACT_VERSION.to_string(),
        }
    }

    pub fn unhealthy(build_id: impl Into<String>) -> Self {
        Self {
            ok: false,
            build_id: build_id.into(),
            contract_version: CONTRACT_VERSION.to_string(),
        }
    }
}

/// Check system health and return a `HealthResponse`.
pub fn check_health(build_id: &str) -> HealthResponse {
    HealthResponse::healthy(build_id)
}

/// Exit code for healthy system.
pub const EXIT_HEALTHY: i32 = 0;
/// Exit code for unhealthy system.
pub const EXIT_UNHEALTHY: i32 = 1;
/// Exit code when health cannot be determined.
pub const EXIT_ERROR: i32 = 2;

/// Get the exit code for a health response.
pub fn exit_code(response: &HealthResponse) -> i32 {
    if response.ok {
        EXIT_HEALTHY
    } else {
        EXIT_UNHEALTHY
    }
}
