//! Seams between the coordinator and the contexts it does not own.

use crate::coordinator::tabs::TabId;
use crate::error::BriefError;
use crate::page::context::{PageContext, PageReply, PageRequest};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub url: String,
    pub title: String,
}

/// Delivers page messages into a tab's page-side script.
pub trait PageHost: Send + Sync {
    fn send(&self, tab: TabId, request: PageRequest) -> Result<PageReply, BriefError>;
    fn describe(&self, tab: TabId) -> Result<TabInfo, BriefError>;
}

pub trait PopupHost: Send + Sync {
    /// Try to show the transient UI. `false` means the platform refused,
    /// which is expected and not an error.
    fn try_open(&self) -> bool;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    Selection,
    Page,
}

pub trait MenuRegistry {
    fn register(&mut self, id: &'static str, title: &'static str, context: MenuContext);
}

/// Pages held in this process, keyed by tab.
#[derive(Debug, Default)]
pub struct LocalPages {
    pages: Mutex<BTreeMap<TabId, PageContext>>,
}

impl LocalPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tab: TabId, page: PageContext) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(tab, page);
        }
    }

    pub fn take(&self, tab: TabId) -> Option<PageContext> {
        self.pages.lock().ok()?.remove(&tab)
    }

    fn with_page<T>(
        &self,
        tab: TabId,
        f: impl FnOnce(&mut PageContext) -> T,
    ) -> Result<T, BriefError> {
        let mut pages = self
            .pages
            .lock()
            .map_err(|_| BriefError::Internal("page table poisoned".to_string()))?;
        let page = pages
            .get_mut(&tab)
            .ok_or_else(|| BriefError::PageAccess(format!("no page loaded in tab {tab}")))?;
        if !page.accessible() {
            return Err(BriefError::PageAccess(format!(
                "script injection blocked on {}",
                page.url
            )));
        }
        Ok(f(page))
    }
}

impl PageHost for LocalPages {
    fn send(&self, tab: TabId, request: PageRequest) -> Result<PageReply, BriefError> {
        self.with_page(tab, |page| page.handle(request))
    }

    fn describe(&self, tab: TabId) -> Result<TabInfo, BriefError> {
        let pages = self
            .pages
            .lock()
            .map_err(|_| BriefError::Internal("page table poisoned".to_string()))?;
        let page = pages
            .get(&tab)
            .ok_or_else(|| BriefError::PageAccess(format!("no page loaded in tab {tab}")))?;
        Ok(TabInfo {
            url: page.url.clone(),
            title: page.title.clone(),
        })
    }
}

/// Popup stand-in for runs without a UI surface.
#[derive(Debug, Default)]
pub struct HeadlessPopup {
    openable: bool,
    opens: AtomicUsize,
}

impl HeadlessPopup {
    pub fn new(openable: bool) -> Self {
        Self {
            openable,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl PopupHost for HeadlessPopup {
    fn try_open(&self) -> bool {
        if self.openable {
            self.opens.fetch_add(1, Ordering::SeqCst);
        }
        self.openable
    }
}

/// Keeps every notification; used where the caller wants to report them.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    seen: Mutex<Vec<(String, String)>>,
}

impl CollectingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((title.to_string(), message.to_string()));
        }
    }
}

/// Registry that just lists what was registered.
#[derive(Debug, Default)]
pub struct MenuList {
    pub items: Vec<(&'static str, &'static str, MenuContext)>,
}

impl MenuRegistry for MenuList {
    fn register(&mut self, id: &'static str, title: &'static str, context: MenuContext) {
        self.items.retain(|(existing, _, _)| *existing != id);
        self.items.push((id, title, context));
    }
}
