use crate::coordinator::util::{read_optional, with_file_lock, write_json_atomic};
use crate::service::types::{DetailLevel, SummaryFormat, SummaryOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Long-lived user preferences shared by every context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub format: SummaryFormat,
    pub detail_level: DetailLevel,
    pub auto_open: bool,
    pub show_notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            format: SummaryFormat::BulletPoints,
            detail_level: DetailLevel::Medium,
            auto_open: true,
            show_notifications: true,
        }
    }
}

impl UserSettings {
    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions::new(self.format, self.detail_level)
    }
}

pub fn settings_path(state_dir: &Path) -> PathBuf {
    state_dir.join("settings.json")
}

pub fn load(state_dir: &Path) -> Result<UserSettings> {
    let path = settings_path(state_dir);
    let Some(raw) = read_optional(&path)? else {
        return Ok(UserSettings::default());
    };
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn save(state_dir: &Path, settings: &UserSettings) -> Result<PathBuf> {
    let path = settings_path(state_dir);
    with_file_lock(&path, || write_json_atomic(&path, settings))?;
    Ok(path)
}
