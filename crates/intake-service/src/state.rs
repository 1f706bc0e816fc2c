//! Shared application state: constructed once at process start and
//! cloned (cheaply, via `Arc`) into every request handler.

use intake_core::edge::{self, EdgeModules, NoopEdgeLoadAudit};
use intake_core::metrics::PipelineMetrics;
use intake_store::audit::{EdgeLoaderAuditLog, ProfitGateAuditLog, RejectionAuditLog, SubmitGuardAuditLog};
use intake_store::config::IntakeConfig;
use intake_store::store::IntentStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub struct LogPaths {
    pub rejections: PathBuf,
    pub submission_guard: PathBuf,
    pub edge_loader: PathBuf,
    pub profit_gate: PathBuf,
}

impl LogPaths {
    pub fn under(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        LogPaths {
            rejections: dir.join("rejections.jsonl"),
            submission_guard: dir.join("submission-guard.jsonl"),
            edge_loader: dir.join("edge-loader.jsonl"),
            profit_gate: dir.join("profit-gate.jsonl"),
        }
    }
}

pub struct AppState {
    pub config: IntakeConfig,
    pub store: IntentStore,
    pub metrics: PipelineMetrics,
    pub edge_modules: EdgeModules,
    pub build_id: String,
    pub rejection_audit: Mutex<RejectionAuditLog>,
    pub submit_guard_audit: Mutex<SubmitGuardAuditLog>,
    pub profit_gate_audit: Mutex<ProfitGateAuditLog>,
}

impl AppState {
    pub fn new(config: IntakeConfig, log_paths: LogPaths, build_id: String) -> Arc<Self> {
        let mut edge_loader_audit = EdgeLoaderAuditLog::new(&log_paths.edge_loader);
        let edge_modules = edge::load_edge_modules(false, &mut edge_loader_audit);

        Arc::new(AppState {
            config,
            store: IntentStore::new(),
            metrics: PipelineMetrics::new(),
            edge_modules,
            build_id,
            rejection_audit: Mutex::new(RejectionAuditLog::new(&log_paths.rejections)),
            submit_guard_audit: Mutex::new(SubmitGuardAuditLog::new(&log_paths.submission_guard)),
            profit_gate_audit: Mutex::new(ProfitGateAuditLog::new(&log_paths.profit_gate)),
        })
    }

    /// Test-only constructor that skips touching the filesystem for the
    /// edge-loader audit line.
    pub fn for_tests(config: IntakeConfig) -> Arc<Self> {
        let mut audit = NoopEdgeLoadAudit;
        let edge_modules = edge::load_edge_modules(false, &mut audit);
        Arc::new(AppState {
            config,
            store: IntentStore::new(),
            metrics: PipelineMetrics::new(),
            edge_modules,
            build_id: "test-build".to_string(),
            rejection_audit: Mutex::new(RejectionAuditLog::new(std::env::temp_dir().join("intake-test-rejections.jsonl"))),
            submit_guard_audit: Mutex::new(SubmitGuardAuditLog::new(std::env::temp_dir().join("intake-test-submit-guard.jsonl"))),
            profit_gate_audit: Mutex::new(ProfitGateAuditLog::new(std::env::temp_dir().join("intake-test-profit-gate.jsonl"))),
        })
    }
}
