pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod host;
pub mod paths;
pub mod popup;
pub mod router;
pub mod settings;
pub mod store;
pub mod tabs;
pub mod util;
pub mod warn;

use crate::coordinator::config::BriefConfig;
use crate::coordinator::host::{MenuRegistry, Notifier, PageHost, PopupHost};
use crate::coordinator::paths::BriefPaths;
use crate::coordinator::settings::UserSettings;
use crate::coordinator::store::EphemeralStore;
use crate::coordinator::tabs::TabStateTable;
use crate::service::client::Summarizer;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Explicit state service for the background context. Everything it keeps
/// across invocations lives on disk under `paths.state_dir`, so a fresh
/// instance picks up where a torn-down one stopped.
pub struct Coordinator {
    pub paths: BriefPaths,
    pub config: BriefConfig,
    pub store: EphemeralStore,
    pub tabs: TabStateTable,
    pub summarizer: Arc<dyn Summarizer>,
    pub pages: Arc<dyn PageHost>,
    pub popup: Arc<dyn PopupHost>,
    pub notifier: Arc<dyn Notifier>,
}

impl Coordinator {
    pub fn new(
        paths: BriefPaths,
        config: BriefConfig,
        summarizer: Arc<dyn Summarizer>,
        pages: Arc<dyn PageHost>,
        popup: Arc<dyn PopupHost>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = EphemeralStore::open(
            &paths.state_dir,
            Duration::from_secs(config.handoff.ttl_secs),
        );
        let tabs = TabStateTable::open(&paths.state_dir);
        Self {
            paths,
            config,
            store,
            tabs,
            summarizer,
            pages,
            popup,
            notifier,
        }
    }

    pub fn settings(&self) -> Result<UserSettings> {
        settings::load(&self.paths.state_dir)
    }

    /// Runs on every coordinator start, not only on install, so menus exist
    /// after any restart.
    pub fn startup(&self, menus: &mut dyn MenuRegistry) {
        let count = dispatcher::register_menus(menus);
        audit::record(
            &self.paths,
            "startup",
            "ok",
            &format!("registered {count} context menu items"),
        );
    }
}
