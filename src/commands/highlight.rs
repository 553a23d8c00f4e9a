use anyhow::Result;
use serde_json::{Value, json};
use std::path::Path;

use crate::commands::{CommandReport, PAGE_TAB, Session};

fn record_marks(report: &mut CommandReport, response: &Value) {
    if let Some(marks) = response.get("marks").and_then(Value::as_u64) {
        report.detail(format!("marks={marks}"));
    }
}

pub fn run(page: &Path, text: &str, out: Option<&Path>) -> Result<CommandReport> {
    let mut report = CommandReport::new("highlight");
    let session = Session::open(Some(page), false)?;

    let response = session
        .router
        .call("highlightText", json!({"tabId": PAGE_TAB, "text": text}));
    record_marks(&mut report, &response);
    if response.get("success").and_then(Value::as_bool) == Some(false) {
        report.detail("no occurrence of the text on this page");
    }
    report.response(response);
    session.save_page(out, &mut report)?;
    Ok(report)
}

pub fn run_remove(page: &Path, out: Option<&Path>) -> Result<CommandReport> {
    let mut report = CommandReport::new("unhighlight");
    let session = Session::open(Some(page), false)?;

    let response = session
        .router
        .call("removeHighlight", json!({"tabId": PAGE_TAB}));
    record_marks(&mut report, &response);
    report.response(response);
    session.save_page(out, &mut report)?;
    Ok(report)
}
