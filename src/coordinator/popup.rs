use crate::coordinator::dispatcher::Trigger;
use crate::coordinator::router::Router;
use crate::coordinator::store::PendingSelection;
use crate::coordinator::tabs::TabId;
use crate::service::types::SummaryResponse;
use serde_json::{Value, json};

/// What the transient UI ends up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupView {
    Idle,
    Summary {
        summary: SummaryResponse,
        source_url: String,
    },
    Failed {
        message: String,
    },
}

fn failure(response: &Value) -> Option<PopupView> {
    let message = response.get("error")?.as_str()?;
    Some(PopupView::Failed {
        message: message.to_string(),
    })
}

/// The UI side of the message contract. It owns nothing; every step is a
/// request to the router.
pub struct PopupController<'a> {
    router: &'a Router,
}

impl<'a> PopupController<'a> {
    pub fn new(router: &'a Router) -> Self {
        Self { router }
    }

    /// On open: pick up a pending hand-off, summarize it unless the
    /// coordinator already did, acknowledge it, and mark the source text.
    pub fn open(&self, tab: Option<TabId>) -> PopupView {
        let stored = self.router.call("getStoredText", json!({}));
        if let Some(view) = failure(&stored) {
            return view;
        }
        if stored.get("text").is_none() {
            return PopupView::Idle;
        }
        let record: PendingSelection = match serde_json::from_value(stored) {
            Ok(record) => record,
            Err(err) => {
                return PopupView::Failed {
                    message: format!("Unreadable hand-off record: {err}"),
                };
            }
        };

        let summary = match record.summary.clone() {
            Some(summary) => summary,
            None => {
                let options = record.summary_options.unwrap_or_default();
                let response = self.router.call(
                    "summarizeText",
                    json!({"data": {
                        "text": record.text,
                        "format": options.format.as_str(),
                        "detailLevel": options.detail_level.as_str(),
                    }}),
                );
                if let Some(view) = failure(&response) {
                    return view;
                }
                match serde_json::from_value(response) {
                    Ok(summary) => {
                        if let Some(tab) = tab {
                            self.router.call(
                                "highlightText",
                                json!({"tabId": tab, "text": record.text}),
                            );
                        }
                        summary
                    }
                    Err(err) => {
                        return PopupView::Failed {
                            message: format!("Unreadable summary: {err}"),
                        };
                    }
                }
            }
        };

        self.router
            .call("ackStoredText", json!({"createdAt": record.created_at}));
        PopupView::Summary {
            summary,
            source_url: record.source_url,
        }
    }

    /// The "summarize this page" button.
    pub fn summarize_tab(&self, tab: TabId) -> PopupView {
        let response = self.router.call(
            "triggerIntent",
            json!({"trigger": Trigger::PopupButton, "tabId": tab}),
        );
        if let Some(view) = failure(&response) {
            return view;
        }
        match response.get("outcome").and_then(Value::as_str) {
            Some("summarized") => match serde_json::from_value(response["summary"].clone()) {
                Ok(summary) => PopupView::Summary {
                    summary,
                    source_url: String::new(),
                },
                Err(err) => PopupView::Failed {
                    message: format!("Unreadable summary: {err}"),
                },
            },
            _ => PopupView::Failed {
                message: "No text found to summarize on this page.".to_string(),
            },
        }
    }

    pub fn server_running(&self) -> bool {
        self.router
            .call("checkServerStatus", json!({}))
            .get("healthy")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::dispatcher::{self, PipelineOutcome};
    use crate::coordinator::store::Lookup;
    use crate::coordinator::testing::{FakeSummarizer, article_page, fixture};
    use crate::error::BriefError;
    use tempfile::tempdir;

    #[test]
    fn open_consumes_handoff_and_acknowledges_it() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        fx.pages.insert(1, article_page("https://example.com/a", ""));
        let outcome = dispatcher::run(&fx.coordinator, &Trigger::ActionClick, 1).expect("run");
        assert!(matches!(outcome, PipelineOutcome::HandedOff { .. }));

        let router = Router::new(fx.coordinator.clone());
        let view = PopupController::new(&router).open(Some(1));
        let PopupView::Summary { source_url, .. } = view else {
            panic!("expected summary, got {view:?}");
        };
        assert_eq!(source_url, "https://example.com/a");
        assert_eq!(fx.summarizer.calls(), 1);
        assert_eq!(fx.coordinator.store.get().expect("get"), Lookup::Empty);
        assert!(fx.pages.take(1).expect("page").highlight_active());
    }

    #[test]
    fn open_reuses_summary_stored_by_coordinator() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), false);
        fx.pages.insert(1, article_page("https://example.com/a", ""));
        dispatcher::run(&fx.coordinator, &Trigger::Command("summarize-page".into()), 1)
            .expect("run");
        assert_eq!(fx.summarizer.calls(), 1);

        let router = Router::new(fx.coordinator.clone());
        let view = PopupController::new(&router).open(None);
        assert!(matches!(view, PopupView::Summary { .. }));
        assert_eq!(fx.summarizer.calls(), 1);
    }

    #[test]
    fn open_with_nothing_pending_is_idle() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        let router = Router::new(fx.coordinator.clone());
        assert_eq!(PopupController::new(&router).open(None), PopupView::Idle);
    }

    #[test]
    fn failed_summary_keeps_handoff_for_retry() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(
            tmp.path(),
            FakeSummarizer::failing(BriefError::Application("model overloaded".into())),
            true,
        );
        fx.pages.insert(1, article_page("https://example.com/a", ""));
        dispatcher::run(&fx.coordinator, &Trigger::ActionClick, 1).expect("run");

        let router = Router::new(fx.coordinator.clone());
        let view = PopupController::new(&router).open(Some(1));
        assert_eq!(
            view,
            PopupView::Failed {
                message: "Request rejected: model overloaded".to_string()
            }
        );
        assert!(matches!(fx.coordinator.store.get().expect("get"), Lookup::Present(_)));
    }

    #[test]
    fn summarize_button_and_server_probe() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        fx.pages.insert(4, article_page("https://example.com/a", ""));
        let router = Router::new(fx.coordinator.clone());
        let popup = PopupController::new(&router);

        assert!(popup.server_running());
        assert!(matches!(popup.summarize_tab(4), PopupView::Summary { .. }));
        assert!(matches!(popup.summarize_tab(99), PopupView::Failed { .. }));
    }
}
