use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::commands::{CommandReport, Session};
use crate::coordinator::tabs::TabId;

fn call(command: &str, action: &str, payload: Value) -> Result<CommandReport> {
    let mut report = CommandReport::new(command);
    let session = Session::open(None, false)?;
    let response = session.router.call(action, payload);
    if let Some(removed) = response.get("removed").and_then(Value::as_bool) {
        report.detail(format!("removed={removed}"));
    }
    if let Some(state) = response.get("state") {
        report.detail(format!("state={state}"));
    }
    report.response(response);
    Ok(report)
}

pub fn set(tab: TabId, state: &str) -> Result<CommandReport> {
    let state: Value = serde_json::from_str(state).context("tab state must be JSON")?;
    call(
        "tabs-set",
        "updateTabState",
        json!({"tabId": tab, "state": state}),
    )
}

pub fn get(tab: TabId) -> Result<CommandReport> {
    call("tabs-get", "getTabState", json!({"tabId": tab}))
}

pub fn remove(tab: TabId) -> Result<CommandReport> {
    call("tabs-remove", "tabRemoved", json!({"tabId": tab}))
}

pub fn navigated(tab: TabId) -> Result<CommandReport> {
    call("tabs-navigated", "tabNavigated", json!({"tabId": tab}))
}
