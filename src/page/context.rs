use crate::page::dom::{Document, NodeSpec};
use crate::page::extract::{self, ExtractionResult};
use crate::page::highlight::HighlightEngine;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const RESTRICTED_SCHEMES: [&str; 6] = [
    "chrome://",
    "chrome-extension://",
    "edge://",
    "about:",
    "view-source:",
    "devtools://",
];

/// On-disk form of one open page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selection: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub restricted: bool,
    pub body: NodeSpec,
}

/// Messages the page-side script answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    GetSelectedText,
    GetFullPageText,
    GetTabContent,
    HighlightText { text: String },
    RemoveHighlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageReply {
    Extraction(ExtractionResult),
    Highlight { success: bool, marks: usize },
}

/// Page-side state for one tab: the live document, the user's selection,
/// and the current highlight generation. Nothing here survives a reload.
#[derive(Debug)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    pub restricted: bool,
    pub selection: String,
    pub document: Document,
    highlight: HighlightEngine,
}

impl PageContext {
    pub fn new(url: &str, title: &str, document: Document) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            restricted: false,
            selection: String::new(),
            document,
            highlight: HighlightEngine::new(),
        }
    }

    pub fn from_snapshot(snapshot: PageSnapshot) -> Self {
        let mut ctx = Self::new(
            &snapshot.url,
            &snapshot.title,
            Document::from_spec(&snapshot.body),
        );
        ctx.selection = snapshot.selection;
        ctx.restricted = snapshot.restricted;
        ctx
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url.clone(),
            title: self.title.clone(),
            selection: self.selection.clone(),
            restricted: self.restricted,
            body: self.document.to_spec(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read page snapshot {}", path.display()))?;
        let snapshot: PageSnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse page snapshot {}", path.display()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, format!("{data}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Hosts refuse script access to browser-internal pages.
    pub fn accessible(&self) -> bool {
        if self.restricted {
            return false;
        }
        let url = self.url.trim().to_ascii_lowercase();
        !RESTRICTED_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
    }

    pub fn highlight_active(&self) -> bool {
        self.highlight.is_active()
    }

    pub fn highlight_generation(&self) -> u64 {
        self.highlight.generation()
    }

    pub fn handle(&mut self, request: PageRequest) -> PageReply {
        match request {
            PageRequest::GetSelectedText => {
                PageReply::Extraction(extract::selected_text(&self.selection))
            }
            PageRequest::GetFullPageText => {
                PageReply::Extraction(extract::main_content(&self.document))
            }
            PageRequest::GetTabContent => {
                PageReply::Extraction(extract::extract(&self.document, &self.selection))
            }
            PageRequest::HighlightText { text } => {
                let marks = self.highlight.apply(&mut self.document, &text);
                PageReply::Highlight {
                    success: marks > 0,
                    marks,
                }
            }
            PageRequest::RemoveHighlight => {
                let marks = self.highlight.revert(&mut self.document);
                PageReply::Highlight {
                    success: true,
                    marks,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::extract::SourceKind;

    fn snapshot_json() -> &'static str {
        r#"{
            "url": "https://example.com/post",
            "title": "Post",
            "selection": "",
            "body": {"tag": "body", "children": [
                {"tag": "main", "children": [
                    {"text": "Borrowing lets functions use values without taking ownership, which keeps APIs flexible and cheap to call."}
                ]}
            ]}
        }"#
    }

    #[test]
    fn snapshot_json_drives_extraction() {
        let snapshot: PageSnapshot = serde_json::from_str(snapshot_json()).expect("parse");
        let mut ctx = PageContext::from_snapshot(snapshot);
        let PageReply::Extraction(result) = ctx.handle(PageRequest::GetTabContent) else {
            panic!("expected extraction");
        };
        assert_eq!(result.source_kind, SourceKind::Content);

        let PageReply::Extraction(selected) = ctx.handle(PageRequest::GetSelectedText) else {
            panic!("expected extraction");
        };
        assert_eq!(selected.source_kind, SourceKind::None);
    }

    #[test]
    fn highlight_round_trip_through_messages() {
        let snapshot: PageSnapshot = serde_json::from_str(snapshot_json()).expect("parse");
        let mut ctx = PageContext::from_snapshot(snapshot);
        let before = ctx.document.text_content(ctx.document.body());

        let reply = ctx.handle(PageRequest::HighlightText {
            text: "Borrowing lets functions".to_string(),
        });
        assert_eq!(reply, PageReply::Highlight { success: true, marks: 1 });
        assert!(ctx.highlight_active());

        let reply = ctx.handle(PageRequest::RemoveHighlight);
        assert_eq!(reply, PageReply::Highlight { success: true, marks: 1 });
        assert_eq!(ctx.document.text_content(ctx.document.body()), before);

        let again = ctx.handle(PageRequest::RemoveHighlight);
        assert_eq!(again, PageReply::Highlight { success: true, marks: 0 });
    }

    #[test]
    fn browser_internal_pages_are_not_accessible() {
        let mut ctx = PageContext::new("chrome://settings", "Settings", Document::new());
        assert!(!ctx.accessible());
        ctx.url = "https://example.com".to_string();
        assert!(ctx.accessible());
        ctx.restricted = true;
        assert!(!ctx.accessible());
    }
}
