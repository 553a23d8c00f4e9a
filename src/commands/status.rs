use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::coordinator::config::load_config;
use crate::coordinator::paths::resolve_paths;
use crate::coordinator::settings;
use crate::coordinator::store::{EphemeralStore, Lookup};
use crate::coordinator::tabs::TabStateTable;
use std::time::Duration;

include!(concat!(env!("OUT_DIR"), "/pagebrief_env_allowlist.rs"));

/// Every `PAGEBRIEF_*` variable the binary reads that is set right now.
pub fn env_overrides() -> Vec<(&'static str, String)> {
    GENERATED_PAGEBRIEF_ENV_ALLOWLIST
        .iter()
        .filter_map(|key| env::var(key).ok().map(|value| (*key, value)))
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");
    report.detail(format!("version={}", env!("CARGO_PKG_VERSION")));
    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("state_dir={}", paths.state_dir.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    let cfg = match load_config(&paths) {
        Ok(cfg) => cfg,
        Err(err) => {
            report.issue(format!("config invalid: {err:#}"));
            return Ok(report);
        }
    };
    report.detail(format!("service.base_url={}", cfg.service.base_url));
    report.detail(format!(
        "service.request_timeout_secs={}",
        cfg.service.request_timeout_secs
    ));
    report.detail(format!("service.profile={}", cfg.service.profile));
    report.detail(format!("handoff.ttl_secs={}", cfg.handoff.ttl_secs));

    match settings::load(&paths.state_dir) {
        Ok(current) => report.detail(format!(
            "settings.format={} settings.detailLevel={}",
            current.format,
            current.detail_level.as_str()
        )),
        Err(err) => report.issue(format!("settings unreadable: {err:#}")),
    }

    let store = EphemeralStore::open(&paths.state_dir, Duration::from_secs(cfg.handoff.ttl_secs));
    report.detail(format!("handoff_path={}", store.path().display()));
    match store.get() {
        Ok(Lookup::Present(record)) => report.detail(format!(
            "handoff=present source_url={}",
            record.source_url
        )),
        Ok(Lookup::Expired) => report.detail("handoff=expired (cleared)"),
        Ok(Lookup::Empty) => report.detail("handoff=empty"),
        Err(err) => report.issue(format!("handoff slot unreadable: {err:#}")),
    }

    match TabStateTable::open(&paths.state_dir).tabs() {
        Ok(tabs) => report.detail(format!("tabs_tracked={}", tabs.len())),
        Err(err) => report.issue(format!("tab state unreadable: {err:#}")),
    }

    for (key, value) in env_overrides() {
        report.detail(format!("env.{key}={value}"));
    }
    Ok(report)
}
