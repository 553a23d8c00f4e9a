use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::commands::{CommandReport, Session};
use crate::coordinator::settings::{UserSettings, settings_path};
use crate::service::types::{DetailLevel, SummaryFormat};

#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub format: Option<String>,
    pub detail: Option<String>,
    pub auto_open: Option<bool>,
    pub notifications: Option<bool>,
}

fn describe(report: &mut CommandReport, settings: &UserSettings) {
    report.detail(format!("format={}", settings.format));
    report.detail(format!("detailLevel={}", settings.detail_level.as_str()));
    report.detail(format!("autoOpen={}", settings.auto_open));
    report.detail(format!("showNotifications={}", settings.show_notifications));
}

fn current(session: &Session, report: &mut CommandReport) -> Result<Option<UserSettings>> {
    let response = session.router.call("getSettings", json!({}));
    if response.get("error").is_some() {
        report.response(response);
        return Ok(None);
    }
    let settings = serde_json::from_value(response).context("unreadable settings response")?;
    Ok(Some(settings))
}

pub fn show() -> Result<CommandReport> {
    let mut report = CommandReport::new("settings-show");
    let session = Session::open(None, false)?;
    report.detail(format!(
        "path={}",
        settings_path(&session.coordinator().paths.state_dir).display()
    ));
    if let Some(settings) = current(&session, &mut report)? {
        describe(&mut report, &settings);
    }
    Ok(report)
}

pub fn set(update: SettingsUpdate) -> Result<CommandReport> {
    let mut report = CommandReport::new("settings-set");
    let session = Session::open(None, false)?;
    let Some(mut settings) = current(&session, &mut report)? else {
        return Ok(report);
    };

    if let Some(raw) = update.format.as_deref() {
        settings.format = raw.parse::<SummaryFormat>()?;
    }
    if let Some(raw) = update.detail.as_deref() {
        settings.detail_level = raw.parse::<DetailLevel>()?;
    }
    if let Some(auto_open) = update.auto_open {
        settings.auto_open = auto_open;
    }
    if let Some(notifications) = update.notifications {
        settings.show_notifications = notifications;
    }

    let response = session
        .router
        .call("saveSettings", json!({"settings": settings}));
    if response.get("success").and_then(Value::as_bool) == Some(true) {
        describe(&mut report, &settings);
    }
    report.response(response);
    Ok(report)
}
