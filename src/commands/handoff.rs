use anyhow::Result;
use chrono::{Local, TimeZone};
use serde_json::{Value, json};

use crate::commands::trigger::record_view;
use crate::commands::{CommandReport, Session};
use crate::coordinator::popup::PopupController;

fn local_time(epoch_millis: u64) -> String {
    Local
        .timestamp_millis_opt(epoch_millis as i64)
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_millis.to_string())
}

pub fn show() -> Result<CommandReport> {
    let mut report = CommandReport::new("handoff-show");
    let session = Session::open(None, false)?;
    let ttl = session.coordinator().store.ttl();
    report.detail(format!("ttl_secs={}", ttl.as_secs()));

    let response = session.router.call("getStoredText", json!({}));
    if response.get("expired").is_some() {
        report.detail("slot=expired (cleared)");
    } else if response.get("empty").is_some() {
        report.detail("slot=empty");
    } else if let Some(text) = response.get("text").and_then(Value::as_str) {
        report.detail("slot=present");
        if let Some(created_at) = response.get("createdAt").and_then(Value::as_u64) {
            report.detail(format!("created_at={}", local_time(created_at)));
        }
        for (label, key) in [("source_url", "sourceUrl"), ("source_title", "sourceTitle")] {
            if let Some(value) = response.get(key).and_then(Value::as_str) {
                report.detail(format!("{label}={value}"));
            }
        }
        report.detail(format!(
            "summarized={}",
            response.get("summary").is_some_and(|v| !v.is_null())
        ));
        report.detail(format!("text_chars={}", text.chars().count()));
    }
    report.response(response);
    Ok(report)
}

/// A manual popup open: consumes the slot the way the UI would.
pub fn open() -> Result<CommandReport> {
    let mut report = CommandReport::new("handoff-open");
    let session = Session::open(None, true)?;
    let view = PopupController::new(&session.router).open(None);
    record_view(&mut report, view);
    Ok(report)
}

pub fn clear() -> Result<CommandReport> {
    let mut report = CommandReport::new("handoff-clear");
    let session = Session::open(None, false)?;
    let response = session.router.call("clearStoredText", json!({}));
    if let Some(cleared) = response.get("cleared").and_then(Value::as_bool) {
        report.detail(format!("cleared={cleared}"));
    }
    report.response(response);
    Ok(report)
}
