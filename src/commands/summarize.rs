use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;

use crate::commands::{CommandReport, Session};

pub enum Input<'a> {
    Text(&'a str),
    File(&'a Path),
}

pub fn run(input: Input<'_>, format: Option<&str>, detail: Option<&str>) -> Result<CommandReport> {
    let mut report = CommandReport::new("summarize");
    let text = match input {
        Input::Text(text) => text.to_string(),
        Input::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
    };
    let session = Session::open(None, false)?;

    let mut data = Map::new();
    data.insert("text".to_string(), Value::String(text));
    if let Some(format) = format {
        data.insert("format".to_string(), Value::String(format.to_string()));
    }
    if let Some(detail) = detail {
        data.insert("detailLevel".to_string(), Value::String(detail.to_string()));
    }

    let response = session.router.call("summarizeText", json!({"data": data}));
    if let Some(summary) = response.get("summary").and_then(Value::as_str) {
        for key in ["format", "originalLength", "summaryLength"] {
            if let Some(value) = response.get(key) {
                report.detail(format!("{key}={value}"));
            }
        }
        report.detail(summary.to_string());
    }
    report.response(response);
    Ok(report)
}
