//! The pluggable "edge" seam (§4.7): five capabilities, each with a safe
//! NOOP default, plus the loader and submit guard that keep the public
//! build from ever attempting a real submission.

mod noop;

pub use noop::{NoopAntiMev, NoopAssembler, NoopCapitalPolicy, NoopInclusionPredictor, NoopRelayRouter};

use crate::model::IntentRecord;

#[derive(Debug, Clone, Default)]
pub struct AssembleConstraints {
    pub max_bundle_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct AssembledBundle {
    pub txs: Vec<String>,
    pub noop: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RouteHints {
    pub target_block: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteDecision {
    pub relays: Vec<String>,
    pub strategy: String,
}

#[derive(Debug, Clone, Default)]
pub struct InclusionPrediction {
    pub probability: f64,
    pub target_block: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct TaggedTxs {
    pub txs: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CapitalAuthorization {
    pub authorized: bool,
    pub reason: Option<String>,
    pub max_gas_wei: Option<String>,
}

/// Assembles raw transactions into a submittable bundle. The submit guard
/// refuses to submit when the loaded assembler is the NOOP default.
pub trait BundleAssembler: Send + Sync {
    fn assemble(&self, intents: &[IntentRecord], constraints: &AssembleConstraints) -> AssembledBundle;

    /// Identity marker used by the submit guard. Never infer NOOP-ness
    /// from a type name comparison (§9 Design Notes) — implementors state
    /// it explicitly.
    fn is_noop(&self) -> bool {
        false
    }
}

pub trait RelayRouter: Send + Sync {
    fn route(&self, bundle: &AssembledBundle, hints: &RouteHints) -> RouteDecision;
}

pub trait InclusionPredictor: Send + Sync {
    fn predict(&self, bundle: &AssembledBundle) -> InclusionPrediction;
}

pub trait AntiMev: Send + Sync {
    fn filter_and_tag(&self, txs: &[String]) -> TaggedTxs;
}

pub trait CapitalPolicy: Send + Sync {
    fn authorize(&self, bundle: &AssembledBundle) -> CapitalAuthorization;
}

/// The resolved set of edge capabilities for this process.
pub struct EdgeModules {
    pub assembler: Box<dyn BundleAssembler>,
    pub router: Box<dyn RelayRouter>,
    pub predictor: Box<dyn InclusionPredictor>,
    pub anti_mev: Box<dyn AntiMev>,
    pub capital_policy: Box<dyn CapitalPolicy>,
}

impl EdgeModules {
    /// All-NOOP defaults: the shape of every public build.
    pub fn noop() -> Self {
        EdgeModules {
            assembler: Box::new(NoopAssembler),
            router: Box::new(NoopRelayRouter),
            predictor: Box::new(NoopInclusionPredictor),
            anti_mev: Box::new(NoopAntiMev),
            capital_policy: Box::new(NoopCapitalPolicy),
        }
    }
}

/// Records the resolved plugin mode for the `edge-loader.jsonl` audit line.
/// Implemented by `intake-store`; a no-op implementation is provided for
/// tests that don't care about the audit trail.
pub trait EdgeLoadAudit {
    fn record_load(&mut self, mode: &str, modules: &[&str]) -> Result<(), String>;
}

pub struct NoopEdgeLoadAudit;

impl EdgeLoadAudit for NoopEdgeLoadAudit {
    fn record_load(&mut self, _mode: &str, _modules: &[&str]) -> Result<(), String> {
        Ok(())
    }
}

/// Resolve the edge module set once per process. `private_enabled` models
/// the environment signal described in §4.7; this build never has a real
/// private module to resolve to, so it always falls back to the NOOP set,
/// but the audit line still distinguishes "asked for private, got none"
/// from "public build, defaults by design".
pub fn load_edge_modules(private_enabled: bool, audit: &mut dyn EdgeLoadAudit) -> EdgeModules {
    let modules = EdgeModules::noop();
    let mode = if private_enabled {
        "private-requested-unavailable"
    } else {
        "public-noop"
    };
    let names = ["assembler", "router", "predictor", "anti_mev", "capital_policy"];
    tracing::info!(mode, "edge modules resolved");
    let _ = audit.record_load(mode, &names);
    modules
}

/// Outcome of the post-QUEUED submit guard (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitGuardOutcome {
    /// A real assembler is loaded; the runner should hand off to the
    /// external submission subsystem.
    Proceed,
    /// The loaded assembler is the NOOP default; the runner must not
    /// advance state past QUEUED.
    NotAttempted,
}

/// Inspect the loaded assembler and decide whether submission should be
/// attempted.
pub fn submit_guard(modules: &EdgeModules) -> SubmitGuardOutcome {
    if modules.assembler.is_noop() {
        SubmitGuardOutcome::NotAttempted
    } else {
        SubmitGuardOutcome::Proceed
    }
}
