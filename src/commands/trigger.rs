use anyhow::Result;
use serde_json::{Value, json};
use std::path::Path;

use crate::commands::{CommandReport, PAGE_TAB, Session};
use crate::coordinator::dispatcher::Trigger;
use crate::coordinator::popup::{PopupController, PopupView};

pub(crate) fn record_view(report: &mut CommandReport, view: PopupView) {
    match view {
        PopupView::Idle => report.detail("popup=idle"),
        PopupView::Summary {
            summary,
            source_url,
        } => {
            if source_url.is_empty() {
                report.detail("popup=summary");
            } else {
                report.detail(format!("popup=summary source_url={source_url}"));
            }
            report.detail(format!(
                "format={} originalLength={} summaryLength={}",
                summary.format, summary.original_length, summary.summary_length
            ));
            report.detail(summary.summary);
        }
        PopupView::Failed { message } => report.issue(message),
    }
}

pub fn run(
    trigger: &str,
    page: &Path,
    no_popup: bool,
    out: Option<&Path>,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("trigger");
    let trigger: Trigger = trigger.parse()?;
    let session = Session::open(Some(page), !no_popup)?;

    if trigger == Trigger::PopupButton {
        let popup = PopupController::new(&session.router);
        record_view(&mut report, popup.summarize_tab(PAGE_TAB));
        session.report_notifications(&mut report);
        session.save_page(out, &mut report)?;
        return Ok(report);
    }

    let response = session.router.call(
        "triggerIntent",
        json!({"trigger": trigger, "tabId": PAGE_TAB}),
    );
    let outcome = response
        .get("outcome")
        .and_then(Value::as_str)
        .unwrap_or("error")
        .to_string();
    report.detail(format!("outcome={outcome}"));
    report.detail(format!("popup_opened={}", session.popup.opens() > 0));

    match outcome.as_str() {
        "handedOff" => {
            let popup = PopupController::new(&session.router);
            record_view(&mut report, popup.open(Some(PAGE_TAB)));
        }
        "summarized" => {
            if let Some(summary) = response.pointer("/summary/summary").and_then(Value::as_str) {
                report.detail(summary.to_string());
            }
        }
        "awaitingManualOpen" => {
            if let Some(error) = response.get("summaryError").and_then(Value::as_str) {
                report.issue(format!("{error} Run `pagebrief handoff open` to retry."));
            } else {
                report.detail("run `pagebrief handoff open` to read the stored result");
            }
        }
        "nothingFound" => report.issue("No text found to summarize on this page."),
        _ => {}
    }
    session.report_notifications(&mut report);
    report.response(response);
    session.save_page(out, &mut report)?;
    Ok(report)
}
