use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix epoch in milliseconds. Hand-off records carry this stamp.
pub fn now_epoch_millis() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?;
    Ok(elapsed.as_millis() as u64)
}

/// Truncate `input` to at most `max_chars` Unicode characters, appending
/// `marker` when anything was cut.
pub fn truncate_chars(input: &str, max_chars: usize, marker: &str) -> String {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = input[..cut].to_string();
            out.push_str(marker);
            out
        }
        None => input.to_string(),
    }
}

/// Prefix of at most `max_chars` characters, always on a char boundary.
pub fn char_prefix(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => &input[..cut],
        None => input,
    }
}

/// Hold an exclusive advisory lock on `<path>.lock` while `f` runs.
///
/// Locks are per open file description, so worker threads in one process
/// serialize against each other as well as against other processes.
pub fn with_file_lock<T>(path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let lock_path = path.with_extension("lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    lock.lock_exclusive()
        .with_context(|| format!("failed to lock {}", lock_path.display()))?;
    let out = f();
    let _ = FileExt::unlock(&lock);
    out
}

/// Write `value` as pretty JSON through a synced temp file and an atomic
/// rename, so a reader never observes a half-written record.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let data = serde_json::to_string_pretty(value)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(format!("{data}\n").as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

pub fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}
