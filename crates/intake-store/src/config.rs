//! Configuration model (§3.1, §6): documented defaults per knob, loaded
//! from TOML with fail-closed behavior when a required value is absent
//! and carries no default.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Every numeric configuration knob named in §6, grouped the way the
/// defaults table in the specification groups them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigParam {
    // Screen stage
    LimitsMaxBytes,
    LimitsMinDeadlineMs,

    // Validate stage
    LimitsMaxGas,
    FeeMultiplier,

    // Policy stage
    QueueCapacity,
    ProfitGateMinRoiBps,

    // Idempotency
    IdempotencyWindowMs,
}

impl ConfigParam {
    pub fn param_name(self) -> &'static str {
        match self {
            ConfigParam::LimitsMaxBytes => "limits.maxBytes",
            ConfigParam::LimitsMinDeadlineMs => "limits.minDeadlineMs",
            ConfigParam::LimitsMaxGas => "limits.maxGas",
            ConfigParam::FeeMultiplier => "feeMultiplier",
            ConfigParam::QueueCapacity => "queueCapacity",
            ConfigParam::ProfitGateMinRoiBps => "profitGate.minRoiBps",
            ConfigParam::IdempotencyWindowMs => "idempotencyWindowMs",
        }
    }

    /// Documented default, applied when the parameter is absent from the
    /// loaded TOML. `None` means there is no safe default and the loader
    /// must fail closed.
    pub fn default_value(self) -> Option<f64> {
        match self {
            ConfigParam::LimitsMaxBytes => Some(65_536.0),
            ConfigParam::LimitsMinDeadlineMs => Some(0.0),
            ConfigParam::LimitsMaxGas => Some(30_000_000.0),
            ConfigParam::FeeMultiplier => Some(1.0),
            ConfigParam::QueueCapacity => Some(10_000.0),
            ConfigParam::ProfitGateMinRoiBps => Some(0.0),
            ConfigParam::IdempotencyWindowMs => Some(60_000.0),
        }
    }
}

pub const ALL_PARAMS: &[ConfigParam] = &[
    ConfigParam::LimitsMaxBytes,
    ConfigParam::LimitsMinDeadlineMs,
    ConfigParam::LimitsMaxGas,
    ConfigParam::FeeMultiplier,
    ConfigParam::QueueCapacity,
    ConfigParam::ProfitGateMinRoiBps,
    ConfigParam::IdempotencyWindowMs,
];

pub const EXPECTED_PARAM_COUNT: usize = 7;

/// Raised when a required parameter has neither a loaded value nor a
/// documented default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingConfigError {
    pub param_name: &'static str,
    pub reason: String,
}

impl fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required config {}: {}", self.param_name, self.reason)
    }
}

impl std::error::Error for MissingConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfitGateSettings {
    pub min_profit_wei: String,
    pub min_roi_bps: i64,
}

fn default_max_bytes() -> u64 {
    ConfigParam::LimitsMaxBytes.default_value().unwrap() as u64
}
fn default_min_deadline_ms() -> i64 {
    ConfigParam::LimitsMinDeadlineMs.default_value().unwrap() as i64
}
fn default_max_gas() -> i64 {
    ConfigParam::LimitsMaxGas.default_value().unwrap() as i64
}
fn default_fee_multiplier() -> f64 {
    ConfigParam::FeeMultiplier.default_value().unwrap()
}
fn default_queue_capacity() -> i64 {
    ConfigParam::QueueCapacity.default_value().unwrap() as i64
}
fn default_idempotency_window_ms() -> i64 {
    ConfigParam::IdempotencyWindowMs.default_value().unwrap() as i64
}

/// The fully resolved runtime configuration for one intake process.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeConfig {
    #[serde(default)]
    pub limits: Limits,
    pub chain_id: Option<String>,
    #[serde(default = "default_fee_multiplier")]
    pub fee_multiplier: f64,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: i64,
    #[serde(default)]
    pub profit_gate: ProfitGate,
    #[serde(default = "default_idempotency_window_ms")]
    pub idempotency_window_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_max_gas")]
    pub max_gas: i64,
    #[serde(default = "default_min_deadline_ms")]
    pub min_deadline_ms: i64,
    #[serde(default)]
    pub rate_limit: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_bytes: default_max_bytes(),
            max_gas: default_max_gas(),
            min_deadline_ms: default_min_deadline_ms(),
            rate_limit: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub allowed_accounts: Option<HashSet<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitGate {
    pub min_profit_wei: Option<String>,
    #[serde(default)]
    pub min_roi_bps: i64,
}

impl Default for ProfitGate {
    fn default() -> Self {
        ProfitGate {
            min_profit_wei: None,
            min_roi_bps: ConfigParam::ProfitGateMinRoiBps.default_value().unwrap() as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Missing(MissingConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(reason) => write!(f, "failed to parse config: {reason}"),
            ConfigError::Missing(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl IntakeConfig {
    /// Load from a TOML document, applying documented defaults for any
    /// absent optional field and failing closed if parsing fails.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| {
            tracing::warn!(error = %e, "config failed to parse, failing closed");
            ConfigError::Parse(e.to_string())
        })
    }

    /// `None` means the profit gate is disabled: the Policy stage skips
    /// it entirely rather than failing closed, since not every deployment
    /// runs against MEV candidates.
    pub fn profit_gate_settings(&self) -> Option<ProfitGateSettings> {
        self.profit_gate.min_profit_wei.clone().map(|min_profit_wei| ProfitGateSettings {
            min_profit_wei,
            min_roi_bps: self.profit_gate.min_roi_bps,
        })
    }

    /// Applies `INTAKE_*` environment overrides on top of whatever was
    /// loaded from TOML. Each override is parsed independently; a present
    /// but unparseable variable is ignored and the TOML/default value
    /// stands, so a typo in the environment never takes the process down.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parsed("INTAKE_LIMITS_MAX_BYTES") {
            self.limits.max_bytes = v;
        }
        if let Some(v) = env_parsed("INTAKE_LIMITS_MAX_GAS") {
            self.limits.max_gas = v;
        }
        if let Some(v) = env_parsed("INTAKE_LIMITS_MIN_DEADLINE_MS") {
            self.limits.min_deadline_ms = v;
        }
        if let Some(v) = env_parsed("INTAKE_LIMITS_RATE_LIMIT") {
            self.limits.rate_limit = v;
        }
        if let Ok(v) = std::env::var("INTAKE_CHAIN_ID") {
            self.chain_id = Some(v);
        }
        if let Some(v) = env_parsed("INTAKE_FEE_MULTIPLIER") {
            self.fee_multiplier = v;
        }
        if let Some(v) = env_parsed("INTAKE_QUEUE_CAPACITY") {
            self.queue_capacity = v;
        }
        if let Some(v) = env_parsed("INTAKE_PROFIT_GATE_MIN_ROI_BPS") {
            self.profit_gate.min_roi_bps = v;
        }
        if let Ok(v) = std::env::var("INTAKE_PROFIT_GATE_MIN_PROFIT_WEI") {
            self.profit_gate.min_profit_wei = Some(v);
        }
        if let Some(v) = env_parsed("INTAKE_IDEMPOTENCY_WINDOW_MS") {
            self.idempotency_window_ms = v;
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for IntakeConfig {
    fn default() -> Self {
        IntakeConfig {
            limits: Limits::default(),
            chain_id: None,
            fee_multiplier: default_fee_multiplier(),
            policy: Policy::default(),
            queue_capacity: default_queue_capacity(),
            profit_gate: ProfitGate::default(),
            idempotency_window_ms: default_idempotency_window_ms(),
        }
    }
}
