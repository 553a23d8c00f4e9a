use anyhow::Result;
use serde_json::{Value, json};
use std::path::Path;

use crate::coordinator::dispatcher::Scope;
use crate::commands::{CommandReport, PAGE_TAB, Session};

pub fn run(page: &Path, scope: Scope) -> Result<CommandReport> {
    let mut report = CommandReport::new("extract");
    let session = Session::open(Some(page), false)?;

    let action = match scope {
        Scope::Selection => "getTabContent",
        Scope::Page => "getFullPageText",
    };
    let response = session.router.call(action, json!({"tabId": PAGE_TAB}));
    if response.get("error").is_none() {
        let source = response
            .get("sourceKind")
            .and_then(Value::as_str)
            .unwrap_or("none");
        let length = response.get("length").and_then(Value::as_u64).unwrap_or(0);
        report.detail(format!("source={source}"));
        report.detail(format!("length={length}"));
        if length == 0 {
            report.issue("No text found to summarize on this page.");
        } else if let Some(text) = response.get("text").and_then(Value::as_str) {
            report.detail(text.to_string());
        }
    }
    report.response(response);
    Ok(report)
}
