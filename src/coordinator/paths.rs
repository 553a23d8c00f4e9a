use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BriefPaths {
    pub home: PathBuf,
    pub state_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl BriefPaths {
    pub fn under(home: PathBuf) -> Self {
        Self {
            state_dir: home.join("state"),
            logs_dir: home.join("logs"),
            home,
        }
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<BriefPaths> {
    let home = match env::var("PAGEBRIEF_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".pagebrief"),
    };

    let mut paths = BriefPaths::under(home);
    paths.state_dir = env_or_default_path("PAGEBRIEF_STATE_DIR", paths.state_dir);
    paths.logs_dir = env_or_default_path("PAGEBRIEF_LOGS_DIR", paths.logs_dir);
    Ok(paths)
}
