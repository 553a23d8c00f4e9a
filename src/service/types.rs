use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inputs shorter than this (after trimming) never reach the network.
pub const MIN_SUMMARY_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFormat {
    #[default]
    BulletPoints,
    Tldr,
    Simplified,
    Detailed,
}

impl SummaryFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BulletPoints => "bullet_points",
            Self::Tldr => "tldr",
            Self::Simplified => "simplified",
            Self::Detailed => "detailed",
        }
    }

    /// `summary_type` value understood by the legacy backend, which has no
    /// detailed mode.
    pub fn legacy_type(self) -> &'static str {
        match self {
            Self::BulletPoints => "bullet",
            Self::Tldr => "tldr",
            Self::Simplified | Self::Detailed => "simple",
        }
    }
}

impl FromStr for SummaryFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullet_points" | "bullet" | "bullets" => Ok(Self::BulletPoints),
            "tldr" | "tl;dr" => Ok(Self::Tldr),
            "simplified" | "simple" => Ok(Self::Simplified),
            "detailed" => Ok(Self::Detailed),
            other => Err(anyhow!(
                "unknown summary format `{other}`; use bullet_points, tldr, simplified or detailed"
            )),
        }
    }
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// `(min_length, max_length)` sent by the `lengths` profile.
    pub fn length_bounds(self) -> (u32, u32) {
        match self {
            Self::Low => (30, 80),
            Self::Medium => (50, 150),
            Self::High => (100, 300),
        }
    }
}

impl FromStr for DetailLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(anyhow!(
                "unknown detail level `{other}`; use low, medium or high"
            )),
        }
    }
}

/// Format preset attached to an intent or a hand-off record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOptions {
    pub format: SummaryFormat,
    pub detail_level: DetailLevel,
}

impl SummaryOptions {
    pub const fn new(format: SummaryFormat, detail_level: DetailLevel) -> Self {
        Self {
            format,
            detail_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub text: String,
    #[serde(default)]
    pub format: SummaryFormat,
    #[serde(default)]
    pub detail_level: DetailLevel,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>, options: SummaryOptions) -> Self {
        Self {
            text: text.into(),
            format: options.format,
            detail_level: options.detail_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub format: SummaryFormat,
}

/// Wire shape of the request body; selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProfile {
    Standard,
    Lengths,
    /// `{text, summary_type}` as read by the first backend release.
    Legacy,
}

impl FromStr for ApiProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "" => Ok(Self::Standard),
            "lengths" | "min_max" => Ok(Self::Lengths),
            "legacy" | "summary_type" => Ok(Self::Legacy),
            other => Err(anyhow!(
                "invalid service profile `{other}`; use `standard`, `lengths` or `legacy`"
            )),
        }
    }
}
