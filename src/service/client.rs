use crate::coordinator::config::BriefConfig;
use crate::error::BriefError;
use crate::service::types::{
    ApiProfile, MIN_SUMMARY_CHARS, SummaryFormat, SummaryRequest, SummaryResponse,
};
use anyhow::Result;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Contract with the remote summarizer. Implementations hold no state
/// between calls.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, BriefError>;
    fn health_check(&self) -> bool;
}

/// Reject text that is missing or too short to be worth a network call.
/// Returns the trimmed text that should be sent.
pub fn validate_request(request: &SummaryRequest) -> Result<&str, BriefError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(BriefError::UserInput("No text to summarize.".to_string()));
    }
    let chars = text.chars().count();
    if chars < MIN_SUMMARY_CHARS {
        return Err(BriefError::UserInput(format!(
            "Text is too short to summarize ({chars} characters; need at least {MIN_SUMMARY_CHARS})."
        )));
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct WireSummary {
    summary: String,
    #[serde(default)]
    original_length: Option<usize>,
    #[serde(default)]
    summary_length: Option<usize>,
    #[serde(default)]
    format: Option<String>,
}

pub struct HttpSummarizer {
    base_url: String,
    profile: ApiProfile,
    timeout: Duration,
    client: Client,
}

impl HttpSummarizer {
    pub fn new(base_url: &str, profile: ApiProfile, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            profile,
            timeout,
            client,
        })
    }

    pub fn from_config(cfg: &BriefConfig) -> Result<Self> {
        Self::new(
            &cfg.service.base_url,
            cfg.api_profile()?,
            Duration::from_secs(cfg.service.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn body(&self, request: &SummaryRequest, text: &str) -> Value {
        match self.profile {
            ApiProfile::Standard => json!({
                "text": text,
                "format": request.format.as_str(),
                "detail_level": request.detail_level.as_str(),
            }),
            ApiProfile::Lengths => {
                let (min_length, max_length) = request.detail_level.length_bounds();
                json!({
                    "text": text,
                    "format": request.format.as_str(),
                    "min_length": min_length,
                    "max_length": max_length,
                })
            }
            ApiProfile::Legacy => json!({
                "text": text,
                "summary_type": request.format.legacy_type(),
            }),
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> BriefError {
        if err.is_timeout() {
            return BriefError::Transport(format!(
                "no response from {} within {}s",
                self.base_url,
                self.timeout.as_secs()
            ));
        }
        BriefError::Transport(format!("cannot reach {}: {err}", self.base_url))
    }
}

fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match json.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => {
                return detail.trim().to_string();
            }
            Some(Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
    }
    status.to_string()
}

fn into_response(wire: WireSummary, requested: SummaryFormat, sent_text: &str) -> SummaryResponse {
    let format = wire
        .format
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(requested);
    SummaryResponse {
        original_length: wire
            .original_length
            .unwrap_or_else(|| sent_text.chars().count()),
        summary_length: wire
            .summary_length
            .unwrap_or_else(|| wire.summary.chars().count()),
        summary: wire.summary,
        format,
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, BriefError> {
        let text = validate_request(request)?;

        let response = self
            .client
            .post(self.endpoint("summarize"))
            .json(&self.body(request, text))
            .send()
            .map_err(|err| self.transport_error(&err))?;

        let status = response.status();
        let body = response.text().map_err(|err| self.transport_error(&err))?;
        if !status.is_success() {
            return Err(BriefError::Application(error_detail(status, &body)));
        }

        let wire: WireSummary = serde_json::from_str(&body).map_err(|err| {
            BriefError::Application(format!("malformed summarizer response: {err}"))
        })?;
        Ok(into_response(wire, request.format, text))
    }

    fn health_check(&self) -> bool {
        self.client
            .get(self.endpoint("health"))
            .send()
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}
