//! Append-only JSONL audit logs (§4.9, §6 persisted state layout):
//! `rejections.jsonl`, `submission-guard.jsonl`, `edge-loader.jsonl`.
//!
//! Each line is a complete JSON object followed by a newline; the writer
//! buffers the line and issues a single write-then-flush so a line is
//! never partially committed.

use intake_core::edge::EdgeLoadAudit;
use intake_core::model::ReasonDetail;
use intake_core::pipeline::{RejectionAudit, SubmitGuardAudit};
use intake_core::stage::policy::{ProfitGateAudit, ProfitGateAuditSink};
use serde::Serialize;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A single append-only JSONL file. Creates parent directories and the
/// file itself on first use.
pub struct JsonlAppender {
    path: PathBuf,
}

impl JsonlAppender {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonlAppender {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, value: &impl Serialize) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create audit log directory {}: {e}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| format!("failed to open audit log {}: {e}", self.path.display()))?;
        let line = serde_json::to_string(value).map_err(|e| format!("failed to encode audit line: {e}"))?;
        file.write_all(line.as_bytes())
            .map_err(|e| format!("failed to write audit log {}: {e}", self.path.display()))?;
        file.write_all(b"\n")
            .map_err(|e| format!("failed to write audit newline {}: {e}", self.path.display()))?;
        file.flush()
            .map_err(|e| format!("failed to flush audit log {}: {e}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "audit line appended");
        Ok(())
    }
}

/// Backs `rejections.jsonl`.
pub struct RejectionAuditLog {
    appender: JsonlAppender,
}

impl RejectionAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        RejectionAuditLog {
            appender: JsonlAppender::new(path),
        }
    }
}

impl RejectionAudit for RejectionAuditLog {
    fn record_rejection(
        &mut self,
        corr_id: &str,
        intent_id: &str,
        stage: &str,
        reason: &ReasonDetail,
    ) -> Result<(), String> {
        self.appender.append(&json!({
            "ts": crate::clock::now_rfc3339(),
            "corr_id": corr_id,
            "intent_id": intent_id,
            "stage": stage,
            "reason": reason,
        }))
    }
}

/// Backs `submission-guard.jsonl`.
pub struct SubmitGuardAuditLog {
    appender: JsonlAppender,
}

impl SubmitGuardAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        SubmitGuardAuditLog {
            appender: JsonlAppender::new(path),
        }
    }
}

impl SubmitGuardAudit for SubmitGuardAuditLog {
    fn record_not_attempted(&mut self, corr_id: &str, intent_id: &str) -> Result<(), String> {
        self.appender.append(&json!({
            "ts": crate::clock::now_rfc3339(),
            "corr_id": corr_id,
            "intent_id": intent_id,
            "guard": "public-noop",
            "reason": "SUBMIT_NOT_ATTEMPTED",
        }))
    }
}

/// Backs `profit-gate.jsonl`: one line per profit-gate evaluation, pass or
/// fail (§4.6 — "every check writes a JSONL audit record regardless of
/// outcome"), independent of whether the outcome also produced a
/// `rejections.jsonl` line.
pub struct ProfitGateAuditLog {
    appender: JsonlAppender,
}

impl ProfitGateAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        ProfitGateAuditLog {
            appender: JsonlAppender::new(path),
        }
    }
}

impl ProfitGateAuditSink for ProfitGateAuditLog {
    fn record(&mut self, intent_id: &str, audit: &ProfitGateAudit) -> Result<(), String> {
        self.appender.append(&json!({
            "ts": crate::clock::now_rfc3339(),
            "intent_id": intent_id,
            "profit_wei": audit.profit_wei,
            "roi_bps": audit.roi_bps,
            "passed": audit.passed,
        }))
    }
}

/// Backs `edge-loader.jsonl`.
pub struct EdgeLoaderAuditLog {
    appender: JsonlAppender,
}

impl EdgeLoaderAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        EdgeLoaderAuditLog {
            appender: JsonlAppender::new(path),
        }
    }
}

impl EdgeLoadAudit for EdgeLoaderAuditLog {
    fn record_load(&mut self, mode: &str, modules: &[&str]) -> Result<(), String> {
        self.appender.append(&json!({
            "ts": crate::clock::now_rfc3339(),
            "mode": mode,
            "modules": modules,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::reason::{self, ReasonCode};
    use tempfile::tempdir;

    #[test]
    fn rejection_audit_appends_one_line_per_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rejections.jsonl");
        let mut log = RejectionAuditLog::new(&path);
        let detail = reason::resolve(ReasonCode::ScreenTooLarge, None);
        log.record_rejection("corr-1", "intent-1", "screen", &detail).unwrap();
        log.record_rejection("corr-2", "intent-2", "screen", &detail).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn submit_guard_audit_records_noop_reason() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("submission-guard.jsonl");
        let mut log = SubmitGuardAuditLog::new(&path);
        log.record_not_attempted("corr-1", "intent-1").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("SUBMIT_NOT_ATTEMPTED"));
    }

    #[test]
    fn profit_gate_audit_records_both_passing_and_failing_checks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profit-gate.jsonl");
        let mut log = ProfitGateAuditLog::new(&path);
        log.record(
            "intent-1",
            &ProfitGateAudit {
                profit_wei: "1000".to_string(),
                roi_bps: 5,
                passed: true,
            },
        )
        .unwrap();
        log.record(
            "intent-2",
            &ProfitGateAudit {
                profit_wei: "-500".to_string(),
                roi_bps: -1,
                passed: false,
            },
        )
        .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"passed\":true"));
        assert!(contents.contains("\"passed\":false"));
    }
}
