use crate::coordinator::paths::BriefPaths;
use crate::coordinator::util::{now_epoch_millis, open_append};
use crate::coordinator::warn;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_millis: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(paths: &BriefPaths, phase: &str, status: &str, message: &str) -> Result<()> {
    let event = AuditEvent {
        at_epoch_millis: now_epoch_millis()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let mut file = open_append(&paths.logs_dir.join("audit.log"))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Audit without failing the caller; a broken log is reported on stderr.
pub fn record(paths: &BriefPaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = append_event(paths, phase, status, message) {
        warn::emit("AUDIT_WRITE", phase, status, "audit log append failed", &format!("{err:#}"));
    }
}
