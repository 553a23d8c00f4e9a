use anyhow::Result;
use serde_json::json;

use crate::commands::{CommandReport, Session};
use crate::coordinator::popup::PopupController;

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("health");
    let session = Session::open(None, false)?;
    let base_url = session.coordinator().config.service.base_url.clone();
    report.detail(format!("base_url={base_url}"));

    let running = PopupController::new(&session.router).server_running();
    if running {
        report.detail("server=running");
    } else {
        report.issue(format!("Summarization server is not running at {base_url}"));
    }
    report.payload = Some(json!({"healthy": running}));
    Ok(report)
}
