//! External triggers mapped onto one extraction -> hand-off -> summarize
//! pipeline. Trigger ids are a stable contract with menus and key bindings.

use crate::coordinator::Coordinator;
use crate::coordinator::audit;
use crate::coordinator::host::{MenuContext, MenuRegistry};
use crate::coordinator::settings::UserSettings;
use crate::coordinator::store::PendingSelection;
use crate::coordinator::tabs::TabId;
use crate::coordinator::util::now_epoch_millis;
use crate::coordinator::warn;
use crate::error::BriefError;
use crate::page::context::{PageReply, PageRequest};
use crate::page::extract::ExtractionResult;
use crate::service::types::{
    DetailLevel, SummaryFormat, SummaryOptions, SummaryRequest, SummaryResponse,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Selection,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Fixed(SummaryOptions),
    UserDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    ContextMenu,
    Command,
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerBinding {
    pub source: TriggerSource,
    pub id: &'static str,
    pub title: &'static str,
    pub scope: Scope,
    pub preset: Preset,
}

const QUICK: Preset = Preset::Fixed(SummaryOptions::new(SummaryFormat::Tldr, DetailLevel::Low));
const DETAILED: Preset =
    Preset::Fixed(SummaryOptions::new(SummaryFormat::Detailed, DetailLevel::High));

pub const BINDINGS: [TriggerBinding; 7] = [
    TriggerBinding {
        source: TriggerSource::ContextMenu,
        id: "summarize-selection",
        title: "Summarize selection",
        scope: Scope::Selection,
        preset: Preset::UserDefault,
    },
    TriggerBinding {
        source: TriggerSource::ContextMenu,
        id: "quick-summary",
        title: "Quick summary (TL;DR)",
        scope: Scope::Selection,
        preset: QUICK,
    },
    TriggerBinding {
        source: TriggerSource::ContextMenu,
        id: "detailed-summary",
        title: "Detailed summary",
        scope: Scope::Selection,
        preset: DETAILED,
    },
    TriggerBinding {
        source: TriggerSource::ContextMenu,
        id: "summarize-page",
        title: "Summarize this page",
        scope: Scope::Page,
        preset: Preset::UserDefault,
    },
    TriggerBinding {
        source: TriggerSource::Command,
        id: "summarize-selection",
        title: "Summarize selection",
        scope: Scope::Selection,
        preset: Preset::UserDefault,
    },
    TriggerBinding {
        source: TriggerSource::Command,
        id: "summarize-page",
        title: "Summarize page",
        scope: Scope::Page,
        preset: Preset::UserDefault,
    },
    TriggerBinding {
        source: TriggerSource::Command,
        id: "quick-summary",
        title: "Quick summary (TL;DR)",
        scope: Scope::Selection,
        preset: QUICK,
    },
];

/// Every way a summarize request can start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Trigger {
    ContextMenu(String),
    Command(String),
    ActionClick,
    PopupButton,
}

impl Trigger {
    /// The popup button comes from a live UI that waits for the result.
    fn ui_is_live(&self) -> bool {
        matches!(self, Trigger::PopupButton)
    }

    fn label(&self) -> String {
        match self {
            Trigger::ContextMenu(id) => format!("menu:{id}"),
            Trigger::Command(id) => format!("command:{id}"),
            Trigger::ActionClick => "action-click".to_string(),
            Trigger::PopupButton => "popup-button".to_string(),
        }
    }
}

impl FromStr for Trigger {
    type Err = BriefError;

    /// Parses the same form `label` produces: `menu:<id>`, `command:<id>`,
    /// `action-click` or `popup-button`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Some(id) = raw.strip_prefix("menu:") {
            return Ok(Trigger::ContextMenu(id.to_string()));
        }
        if let Some(id) = raw.strip_prefix("command:") {
            return Ok(Trigger::Command(id.to_string()));
        }
        match raw {
            "action-click" => Ok(Trigger::ActionClick),
            "popup-button" => Ok(Trigger::PopupButton),
            other => Err(BriefError::UserInput(format!(
                "Unknown trigger '{other}'; use menu:<id>, command:<id>, action-click or popup-button"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub scope: Scope,
    pub options: SummaryOptions,
}

pub fn find_binding(source: TriggerSource, id: &str) -> Option<&'static TriggerBinding> {
    BINDINGS
        .iter()
        .find(|binding| binding.source == source && binding.id == id)
}

pub fn resolve(trigger: &Trigger, settings: &UserSettings) -> Result<Intent, BriefError> {
    let (scope, preset) = match trigger {
        Trigger::ContextMenu(id) => {
            let binding = find_binding(TriggerSource::ContextMenu, id)
                .ok_or_else(|| BriefError::UserInput(format!("Unknown menu item: {id}")))?;
            (binding.scope, binding.preset)
        }
        Trigger::Command(id) => {
            let binding = find_binding(TriggerSource::Command, id)
                .ok_or_else(|| BriefError::UserInput(format!("Unknown command: {id}")))?;
            (binding.scope, binding.preset)
        }
        Trigger::ActionClick | Trigger::PopupButton => (Scope::Page, Preset::UserDefault),
    };
    let options = match preset {
        Preset::Fixed(options) => options,
        Preset::UserDefault => settings.summary_options(),
    };
    Ok(Intent { scope, options })
}

/// Returns how many items were registered.
pub fn register_menus(registry: &mut dyn MenuRegistry) -> usize {
    let mut count = 0;
    for binding in BINDINGS
        .iter()
        .filter(|binding| binding.source == TriggerSource::ContextMenu)
    {
        let context = match binding.scope {
            Scope::Selection => MenuContext::Selection,
            Scope::Page => MenuContext::Page,
        };
        registry.register(binding.id, binding.title, context);
        count += 1;
    }
    count
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PipelineOutcome {
    NothingFound,
    /// Returned straight to the live UI.
    #[serde(rename_all = "camelCase")]
    Summarized { summary: SummaryResponse },
    /// The UI opened and will pick the record up itself.
    #[serde(rename_all = "camelCase")]
    HandedOff { created_at: u64 },
    /// The UI could not be opened; the record waits for a manual open.
    #[serde(rename_all = "camelCase")]
    AwaitingManualOpen {
        created_at: u64,
        summarized: bool,
        #[serde(rename = "summaryError", skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

fn extract_for(
    coordinator: &Coordinator,
    tab: TabId,
    scope: Scope,
) -> Result<ExtractionResult, BriefError> {
    let request = match scope {
        Scope::Selection => PageRequest::GetTabContent,
        Scope::Page => PageRequest::GetFullPageText,
    };
    match coordinator.pages.send(tab, request)? {
        PageReply::Extraction(result) => Ok(result),
        other => Err(BriefError::Internal(format!(
            "unexpected page reply to extraction: {other:?}"
        ))),
    }
}

fn highlight_source(coordinator: &Coordinator, tab: TabId, text: &str) {
    let request = PageRequest::HighlightText {
        text: text.to_string(),
    };
    if let Err(err) = coordinator.pages.send(tab, request) {
        warn::emit(
            "HIGHLIGHT_FAILED",
            "pipeline",
            "highlight",
            "could not mark source text",
            &err.to_string(),
        );
    }
}

pub fn run(
    coordinator: &Coordinator,
    trigger: &Trigger,
    tab: TabId,
) -> Result<PipelineOutcome, BriefError> {
    let settings = coordinator.settings()?;
    let intent = resolve(trigger, &settings)?;
    let label = trigger.label();

    let extraction = extract_for(coordinator, tab, intent.scope)?;
    if extraction.is_empty() {
        if settings.show_notifications {
            coordinator
                .notifier
                .notify("pagebrief", "No text found to summarize on this page.");
        }
        audit::record(&coordinator.paths, "pipeline", "empty", &label);
        return Ok(PipelineOutcome::NothingFound);
    }

    let request = SummaryRequest::new(extraction.text.clone(), intent.options);
    if trigger.ui_is_live() {
        let summary = coordinator.summarizer.summarize(&request)?;
        highlight_source(coordinator, tab, &extraction.text);
        audit::record(&coordinator.paths, "pipeline", "summarized", &label);
        return Ok(PipelineOutcome::Summarized { summary });
    }

    let info = coordinator.pages.describe(tab)?;
    let record = PendingSelection {
        text: extraction.text.clone(),
        source_url: info.url,
        source_title: info.title,
        created_at: now_epoch_millis()?,
        summary_options: Some(intent.options),
        summary: None,
    };
    coordinator.store.put(&record)?;
    audit::record(
        &coordinator.paths,
        "handoff",
        "stored",
        &format!("{label} chars={}", extraction.length),
    );

    if settings.auto_open && coordinator.popup.try_open() {
        return Ok(PipelineOutcome::HandedOff {
            created_at: record.created_at,
        });
    }

    match coordinator.summarizer.summarize(&request) {
        Ok(summary) => {
            coordinator.store.attach_summary(record.created_at, &summary)?;
            highlight_source(coordinator, tab, &extraction.text);
            coordinator.notifier.notify(
                "Summary ready",
                "Open the pagebrief popup to read the summary.",
            );
            audit::record(&coordinator.paths, "pipeline", "stored-summary", &label);
            Ok(PipelineOutcome::AwaitingManualOpen {
                created_at: record.created_at,
                summarized: true,
                error: None,
            })
        }
        Err(err) => {
            coordinator.notifier.notify(
                "pagebrief",
                &format!(
                    "{} Open the pagebrief popup to retry.",
                    err.user_message()
                ),
            );
            audit::record(&coordinator.paths, "pipeline", err.kind().as_str(), &label);
            Ok(PipelineOutcome::AwaitingManualOpen {
                created_at: record.created_at,
                summarized: false,
                error: Some(err.user_message()),
            })
        }
    }
}
