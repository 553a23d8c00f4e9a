use crate::coordinator::Coordinator;
use crate::coordinator::audit;
use crate::coordinator::dispatcher::{self, Trigger};
use crate::coordinator::router::HandlerFn;
use crate::coordinator::settings::{self, UserSettings};
use crate::coordinator::store::{Lookup, PendingSelection};
use crate::coordinator::tabs::TabId;
use crate::coordinator::util::now_epoch_millis;
use crate::error::BriefError;
use crate::page::context::{PageReply, PageRequest};
use crate::service::types::{DetailLevel, SummaryFormat, SummaryOptions, SummaryRequest};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// `(action, handler, completes on a worker thread)`.
pub const ROUTES: [(&str, HandlerFn, bool); 19] = [
    ("getSelectedText", get_selected_text, false),
    ("getFullPageText", get_full_page_text, false),
    ("getTabContent", get_tab_content, false),
    ("highlightText", highlight_text, false),
    ("removeHighlight", remove_highlight, false),
    ("summarizeText", summarize_text, true),
    ("openPopupWithText", open_popup_with_text, false),
    ("checkApiHealth", check_health, true),
    ("checkServerStatus", check_health, true),
    ("getStoredText", get_stored_text, false),
    ("clearStoredText", clear_stored_text, false),
    ("ackStoredText", ack_stored_text, false),
    ("updateTabState", update_tab_state, false),
    ("getTabState", get_tab_state, false),
    ("tabRemoved", tab_removed, false),
    ("tabNavigated", tab_navigated, false),
    ("getSettings", get_settings, false),
    ("saveSettings", save_settings, false),
    ("triggerIntent", trigger_intent, true),
];

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, BriefError> {
    let payload = if payload.is_null() { json!({}) } else { payload };
    serde_json::from_value(payload)
        .map_err(|err| BriefError::UserInput(format!("Invalid request: {err}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, BriefError> {
    serde_json::to_value(value).map_err(|err| BriefError::Internal(err.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabPayload {
    tab_id: TabId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HighlightPayload {
    tab_id: TabId,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummarizeData {
    #[serde(default)]
    text: String,
    format: Option<String>,
    detail_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummarizePayload {
    #[serde(default)]
    data: SummarizeData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenPopupPayload {
    text: String,
    tab_id: Option<TabId>,
    source_url: Option<String>,
    source_title: Option<String>,
    format: Option<String>,
    detail_level: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AckPayload {
    created_at: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabStatePayload {
    tab_id: TabId,
    state: Value,
}

#[derive(Debug, Deserialize)]
struct SettingsPayload {
    settings: UserSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerPayload {
    trigger: Trigger,
    tab_id: TabId,
}

fn options_with_defaults(
    format: Option<&str>,
    detail_level: Option<&str>,
    defaults: SummaryOptions,
) -> Result<SummaryOptions, BriefError> {
    let format = match format {
        Some(raw) => raw
            .parse::<SummaryFormat>()
            .map_err(|err| BriefError::UserInput(err.to_string()))?,
        None => defaults.format,
    };
    let detail_level = match detail_level {
        Some(raw) => raw
            .parse::<DetailLevel>()
            .map_err(|err| BriefError::UserInput(err.to_string()))?,
        None => defaults.detail_level,
    };
    Ok(SummaryOptions::new(format, detail_level))
}

fn extraction(
    coordinator: &Coordinator,
    payload: Value,
    request: PageRequest,
) -> Result<Value, BriefError> {
    let TabPayload { tab_id } = parse(payload)?;
    match coordinator.pages.send(tab_id, request)? {
        PageReply::Extraction(result) => to_json(&result),
        other => Err(BriefError::Internal(format!("unexpected page reply: {other:?}"))),
    }
}

fn get_selected_text(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    extraction(coordinator, payload, PageRequest::GetSelectedText)
}

fn get_full_page_text(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    extraction(coordinator, payload, PageRequest::GetFullPageText)
}

fn get_tab_content(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    extraction(coordinator, payload, PageRequest::GetTabContent)
}

fn highlight_reply(reply: PageReply) -> Result<Value, BriefError> {
    match reply {
        PageReply::Highlight { success, marks } => Ok(json!({"success": success, "marks": marks})),
        other => Err(BriefError::Internal(format!("unexpected page reply: {other:?}"))),
    }
}

fn highlight_text(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let HighlightPayload { tab_id, text } = parse(payload)?;
    highlight_reply(coordinator.pages.send(tab_id, PageRequest::HighlightText { text })?)
}

fn remove_highlight(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let TabPayload { tab_id } = parse(payload)?;
    highlight_reply(coordinator.pages.send(tab_id, PageRequest::RemoveHighlight)?)
}

fn summarize_text(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let SummarizePayload { data } = parse(payload)?;
    let defaults = coordinator.settings()?.summary_options();
    let options = options_with_defaults(
        data.format.as_deref(),
        data.detail_level.as_deref(),
        defaults,
    )?;
    let response = coordinator
        .summarizer
        .summarize(&SummaryRequest::new(data.text, options))?;
    to_json(&response)
}

fn open_popup_with_text(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let body: OpenPopupPayload = parse(payload)?;
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return Err(BriefError::UserInput("No text to hand off.".to_string()));
    }
    let options = options_with_defaults(
        body.format.as_deref(),
        body.detail_level.as_deref(),
        coordinator.settings()?.summary_options(),
    )?;

    let info = match body.tab_id {
        Some(tab) => Some(coordinator.pages.describe(tab)?),
        None => None,
    };
    let record = PendingSelection {
        text,
        source_url: body
            .source_url
            .or_else(|| info.as_ref().map(|i| i.url.clone()))
            .unwrap_or_default(),
        source_title: body
            .source_title
            .or_else(|| info.as_ref().map(|i| i.title.clone()))
            .unwrap_or_default(),
        created_at: now_epoch_millis()?,
        summary_options: Some(options),
        summary: None,
    };
    coordinator.store.put(&record)?;
    let opened = coordinator.popup.try_open();
    Ok(json!({"success": true, "opened": opened, "createdAt": record.created_at}))
}

fn check_health(coordinator: &Coordinator, _payload: Value) -> Result<Value, BriefError> {
    Ok(json!({"healthy": coordinator.summarizer.health_check()}))
}

fn get_stored_text(coordinator: &Coordinator, _payload: Value) -> Result<Value, BriefError> {
    match coordinator.store.get()? {
        Lookup::Present(record) => to_json(&record),
        Lookup::Expired => {
            audit::record(&coordinator.paths, "handoff", "expired", "slot purged on read");
            Ok(json!({"expired": true}))
        }
        Lookup::Empty => Ok(json!({"empty": true})),
    }
}

fn clear_stored_text(coordinator: &Coordinator, _payload: Value) -> Result<Value, BriefError> {
    let cleared = coordinator.store.clear()?;
    Ok(json!({"success": true, "cleared": cleared}))
}

fn ack_stored_text(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let AckPayload { created_at } = parse(payload)?;
    let cleared = coordinator.store.acknowledge(created_at)?;
    Ok(json!({"success": true, "cleared": cleared}))
}

fn update_tab_state(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let TabStatePayload { tab_id, state } = parse(payload)?;
    coordinator.tabs.set(tab_id, state)?;
    Ok(json!({"success": true}))
}

fn get_tab_state(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let TabPayload { tab_id } = parse(payload)?;
    let state = coordinator.tabs.get(tab_id)?;
    Ok(json!({"state": state}))
}

fn tab_removed(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let TabPayload { tab_id } = parse(payload)?;
    let removed = coordinator.tabs.remove(tab_id)?;
    Ok(json!({"success": true, "removed": removed}))
}

fn tab_navigated(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let TabPayload { tab_id } = parse(payload)?;
    let removed = coordinator.tabs.invalidate(tab_id)?;
    Ok(json!({"success": true, "removed": removed}))
}

fn get_settings(coordinator: &Coordinator, _payload: Value) -> Result<Value, BriefError> {
    to_json(&coordinator.settings()?)
}

fn save_settings(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let SettingsPayload { settings: next } = parse(payload)?;
    settings::save(&coordinator.paths.state_dir, &next)?;
    Ok(json!({"success": true}))
}

fn trigger_intent(coordinator: &Coordinator, payload: Value) -> Result<Value, BriefError> {
    let TriggerPayload { trigger, tab_id } = parse(payload)?;
    let outcome = dispatcher::run(coordinator, &trigger, tab_id)?;
    to_json(&outcome)
}

#[cfg(test)]
mod tests {
    use crate::coordinator::router::Router;
    use crate::coordinator::store::PendingSelection;
    use crate::coordinator::testing::{ARTICLE_TEXT, FakeSummarizer, article_page, fixture};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn expired_handoff_reads_expired_then_absent() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        fx.coordinator
            .store
            .put(&PendingSelection {
                text: ARTICLE_TEXT.to_string(),
                source_url: "https://example.com".to_string(),
                source_title: "Example".to_string(),
                created_at: 1,
                summary_options: None,
                summary: None,
            })
            .expect("put");
        let router = Router::new(fx.coordinator.clone());

        assert_eq!(router.call("getStoredText", json!({})), json!({"expired": true}));
        assert_eq!(router.call("getStoredText", json!({})), json!({"empty": true}));
    }

    #[test]
    fn open_popup_with_text_stores_then_acknowledges() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), false);
        fx.pages.insert(3, article_page("https://example.com/doc", ""));
        let router = Router::new(fx.coordinator.clone());

        let opened = router.call(
            "openPopupWithText",
            json!({"text": ARTICLE_TEXT, "tabId": 3, "format": "simple"}),
        );
        assert_eq!(opened["success"], true);
        assert_eq!(opened["opened"], false);

        let stored = router.call("getStoredText", json!({}));
        assert_eq!(stored["sourceUrl"], "https://example.com/doc");
        assert_eq!(stored["summaryOptions"]["format"], "simplified");

        let ack = router.call("ackStoredText", json!({"createdAt": stored["createdAt"]}));
        assert_eq!(ack, json!({"success": true, "cleared": true}));
        assert_eq!(router.call("getStoredText", json!({})), json!({"empty": true}));
    }

    #[test]
    fn tab_state_follows_tab_lifecycle() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        let router = Router::new(fx.coordinator.clone());

        router.call("updateTabState", json!({"tabId": 5, "state": {"panel": "open"}}));
        assert_eq!(
            router.call("getTabState", json!({"tabId": 5})),
            json!({"state": {"panel": "open"}})
        );
        router.call("tabNavigated", json!({"tabId": 5}));
        assert_eq!(router.call("getTabState", json!({"tabId": 5})), json!({"state": null}));
    }

    #[test]
    fn page_messages_round_trip_through_router() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        fx.pages.insert(1, article_page("https://example.com/a", ""));
        let router = Router::new(fx.coordinator.clone());

        let content = router.call("getFullPageText", json!({"tabId": 1}));
        assert_eq!(content["sourceKind"], "content");
        assert_eq!(content["text"], ARTICLE_TEXT);

        let marked = router.call("highlightText", json!({"tabId": 1, "text": "Ownership gives"}));
        assert_eq!(marked, json!({"success": true, "marks": 1}));
        let removed = router.call("removeHighlight", json!({"tabId": 1}));
        assert_eq!(removed["success"], true);

        let missing = router.call("getTabContent", json!({"tabId": 9}));
        assert_eq!(missing["kind"], "page_access");
    }

    #[test]
    fn summarize_uses_saved_settings_as_defaults() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        let router = Router::new(fx.coordinator.clone());
        router.call(
            "saveSettings",
            json!({"settings": {
                "format": "detailed",
                "detailLevel": "high",
                "autoOpen": true,
                "showNotifications": false,
            }}),
        );

        let got = router.call("summarizeText", json!({"data": {"text": ARTICLE_TEXT}}));
        assert_eq!(got["format"], "detailed");
        assert_eq!(got["originalLength"], ARTICLE_TEXT.chars().count());

        let bad = router.call(
            "summarizeText",
            json!({"data": {"text": ARTICLE_TEXT, "format": "haiku"}}),
        );
        assert_eq!(bad["kind"], "user_input");
    }

    #[test]
    fn malformed_payload_is_a_user_input_error() {
        let tmp = tempdir().expect("tempdir");
        let fx = fixture(tmp.path(), FakeSummarizer::ok(), true);
        let router = Router::new(fx.coordinator.clone());
        let got = router.call("getTabState", json!({"tab": "x"}));
        assert_eq!(got["kind"], "user_input");
    }
}
