pub mod extract;
pub mod handoff;
pub mod health;
pub mod highlight;
pub mod menus;
pub mod settings;
pub mod status;
pub mod summarize;
pub mod tabs;
pub mod trigger;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::coordinator::config::load_config;
use crate::coordinator::host::{CollectingNotifier, HeadlessPopup, LocalPages};
use crate::coordinator::paths::resolve_paths;
use crate::coordinator::router::Router;
use crate::coordinator::tabs::TabId;
use crate::page::context::PageContext;
use crate::service::client::HttpSummarizer;

/// Tab a `--page` snapshot is loaded into.
pub const PAGE_TAB: TabId = 1;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            payload: None,
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    /// Keeps the raw response for `--json` output. An error response is
    /// also recorded as an issue.
    pub fn response(&mut self, response: Value) {
        if let Some(message) = response_error(&response) {
            self.issue(message);
        }
        self.payload = Some(response);
    }
}

/// `"<message> (<kind>)"` for an error response, `None` otherwise.
pub fn response_error(response: &Value) -> Option<String> {
    let message = response.get("error")?.as_str()?;
    let kind = response
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("internal");
    Some(format!("{message} ({kind})"))
}

/// One coordinator wired to in-process hosts for a single CLI run.
pub struct Session {
    pub router: Router,
    pub pages: Arc<LocalPages>,
    pub popup: Arc<HeadlessPopup>,
    pub notifier: Arc<CollectingNotifier>,
}

impl Session {
    pub fn open(page: Option<&Path>, popup_openable: bool) -> Result<Self> {
        let paths = resolve_paths()?;
        let config = load_config(&paths)?;
        let summarizer = Arc::new(HttpSummarizer::from_config(&config)?);

        let pages = Arc::new(LocalPages::new());
        if let Some(path) = page {
            let context = PageContext::load(path)
                .with_context(|| format!("failed to load page snapshot {}", path.display()))?;
            pages.insert(PAGE_TAB, context);
        }
        let popup = Arc::new(HeadlessPopup::new(popup_openable));
        let notifier = Arc::new(CollectingNotifier::default());

        let coordinator = Arc::new(Coordinator::new(
            paths,
            config,
            summarizer,
            pages.clone(),
            popup.clone(),
            notifier.clone(),
        ));
        Ok(Self {
            router: Router::new(coordinator),
            pages,
            popup,
            notifier,
        })
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        self.router.coordinator()
    }

    /// Writes the (possibly highlighted) page back out when `out` is set.
    pub fn save_page(&self, out: Option<&Path>, report: &mut CommandReport) -> Result<()> {
        let Some(out) = out else {
            return Ok(());
        };
        let Some(page) = self.pages.take(PAGE_TAB) else {
            report.issue("no page loaded to save");
            return Ok(());
        };
        page.save(out)?;
        report.detail(format!("highlight_active={}", page.highlight_active()));
        report.detail(format!("highlight_generation={}", page.highlight_generation()));
        report.detail(format!("saved_page={}", out.display()));
        Ok(())
    }

    pub fn report_notifications(&self, report: &mut CommandReport) {
        for (title, message) in self.notifier.messages() {
            report.detail(format!("notification: {title}: {message}"));
        }
    }
}
