use crate::coordinator::paths::BriefPaths;
use crate::coordinator::store::DEFAULT_HANDOFF_TTL;
use crate::service::types::ApiProfile;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub profile: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 45,
            profile: "standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    pub ttl_secs: u64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_HANDOFF_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BriefConfig {
    pub service: ServiceConfig,
    pub handoff: HandoffConfig,
}

impl BriefConfig {
    pub fn api_profile(&self) -> Result<ApiProfile> {
        self.service.profile.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialBriefConfig {
    service: Option<ServiceConfig>,
    handoff: Option<HandoffConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &BriefConfig) -> Result<()> {
    let base = cfg.service.base_url.trim();
    if base.is_empty() {
        return Err(anyhow!("invalid service base url: cannot be empty"));
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(anyhow!(
            "invalid service base url `{base}`: expected http:// or https://"
        ));
    }
    if cfg.service.request_timeout_secs == 0 {
        return Err(anyhow!("invalid request timeout: must be >= 1 second"));
    }
    cfg.api_profile()?;
    if cfg.handoff.ttl_secs == 0 {
        return Err(anyhow!("invalid hand-off ttl: must be >= 1 second"));
    }
    Ok(())
}

fn resolve_config_path(paths: &BriefPaths) -> PathBuf {
    if let Ok(custom) = env::var("PAGEBRIEF_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    paths.home.join("pagebrief.toml")
}

fn merge_file_config(base: &mut BriefConfig, raw: &str, origin: &str) -> Result<()> {
    let parsed: PartialBriefConfig = toml::from_str(raw)
        .map_err(|err| anyhow!("failed to parse pagebrief config {origin}: {err}"))?;
    if let Some(service) = parsed.service {
        base.service = service;
    }
    if let Some(handoff) = parsed.handoff {
        base.handoff = handoff;
    }
    Ok(())
}

pub fn load_config(paths: &BriefPaths) -> Result<BriefConfig> {
    let mut cfg = BriefConfig::default();
    let path = resolve_config_path(paths);
    if path.exists() {
        let raw = fs::read_to_string(&path)?;
        merge_file_config(&mut cfg, &raw, &path.display().to_string())?;
    }

    cfg.service.base_url = env_or_string("PAGEBRIEF_API_BASE", &cfg.service.base_url);
    cfg.service.request_timeout_secs =
        env_or_u64("PAGEBRIEF_TIMEOUT_SECS", cfg.service.request_timeout_secs);
    cfg.service.profile = env_or_string("PAGEBRIEF_API_PROFILE", &cfg.service.profile);
    cfg.handoff.ttl_secs = env_or_u64("PAGEBRIEF_HANDOFF_TTL_SECS", cfg.handoff.ttl_secs);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = BriefConfig::default();
        validate(&cfg).expect("defaults validate");
        assert_eq!(cfg.handoff.ttl_secs, 600);
    }

    #[test]
    fn file_sections_replace_defaults() {
        let mut cfg = BriefConfig::default();
        let raw = r#"
[service]
base_url = "http://127.0.0.1:9000"
request_timeout_secs = 5
profile = "lengths"
"#;
        merge_file_config(&mut cfg, raw, "inline").expect("merge");
        assert_eq!(cfg.service.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.api_profile().expect("profile"), ApiProfile::Lengths);
        assert_eq!(cfg.handoff.ttl_secs, 600);
    }

    #[test]
    fn validate_rejects_unknown_profile_and_zero_ttl() {
        let mut cfg = BriefConfig::default();
        cfg.service.profile = "fancy".to_string();
        assert!(validate(&cfg).is_err());

        let mut cfg = BriefConfig::default();
        cfg.handoff.ttl_secs = 0;
        assert!(validate(&cfg).is_err());
    }
}
