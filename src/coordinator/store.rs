use crate::coordinator::util::{
    now_epoch_millis, read_optional, remove_if_exists, with_file_lock, write_json_atomic,
};
use crate::coordinator::warn;
use crate::service::types::{SummaryOptions, SummaryResponse};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HANDOFF_TTL: Duration = Duration::from_secs(600);
const HANDOFF_FILE: &str = "pending_selection.json";

/// Text handed from a trigger to the next UI open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSelection {
    pub text: String,
    pub source_url: String,
    pub source_title: String,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_options: Option<SummaryOptions>,
    /// Present when the coordinator already summarized on the UI's behalf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Present(PendingSelection),
    /// The slot held a record past its TTL; it has been cleared.
    Expired,
    Empty,
}

/// Single-slot, file-backed hand-off area with lazy TTL expiry.
///
/// Every mutation is durable when the call returns.
#[derive(Debug, Clone)]
pub struct EphemeralStore {
    path: PathBuf,
    ttl: Duration,
}

impl EphemeralStore {
    pub fn open(state_dir: &Path, ttl: Duration) -> Self {
        Self {
            path: state_dir.join(HANDOFF_FILE),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read_slot(&self) -> Result<Option<PendingSelection>> {
        let Some(raw) = read_optional(&self.path)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn::emit(
                    "HANDOFF_CORRUPT",
                    "store",
                    "discard",
                    "unparseable hand-off record",
                    &err.to_string(),
                );
                remove_if_exists(&self.path)?;
                Ok(None)
            }
        }
    }

    /// Overwrite the slot unconditionally.
    pub fn put(&self, record: &PendingSelection) -> Result<()> {
        with_file_lock(&self.path, || write_json_atomic(&self.path, record))
    }

    pub fn get(&self) -> Result<Lookup> {
        self.get_at(now_epoch_millis()?)
    }

    /// Read the slot as of `now_ms`. An expired record is cleared as part of
    /// the read.
    pub fn get_at(&self, now_ms: u64) -> Result<Lookup> {
        with_file_lock(&self.path, || {
            let Some(record) = self.read_slot()? else {
                return Ok(Lookup::Empty);
            };
            let age_ms = now_ms.saturating_sub(record.created_at);
            if u128::from(age_ms) > self.ttl.as_millis() {
                remove_if_exists(&self.path)?;
                return Ok(Lookup::Expired);
            }
            Ok(Lookup::Present(record))
        })
    }

    /// Returns whether a record was removed.
    pub fn clear(&self) -> Result<bool> {
        with_file_lock(&self.path, || remove_if_exists(&self.path))
    }

    /// Clear the slot only if it still holds the record stamped
    /// `created_at`; a newer hand-off survives a stale acknowledgement.
    pub fn acknowledge(&self, created_at: u64) -> Result<bool> {
        with_file_lock(&self.path, || match self.read_slot()? {
            Some(record) if record.created_at == created_at => remove_if_exists(&self.path),
            _ => Ok(false),
        })
    }

    /// Attach a finished summary to the record stamped `created_at`.
    /// Returns false when the slot has since been superseded or cleared.
    pub fn attach_summary(&self, created_at: u64, summary: &SummaryResponse) -> Result<bool> {
        with_file_lock(&self.path, || match self.read_slot()? {
            Some(mut record) if record.created_at == created_at => {
                record.summary = Some(summary.clone());
                write_json_atomic(&self.path, &record)?;
                Ok(true)
            }
            _ => Ok(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::types::{DetailLevel, SummaryFormat};
    use tempfile::tempdir;

    fn record(text: &str, created_at: u64) -> PendingSelection {
        PendingSelection {
            text: text.to_string(),
            source_url: "https://example.com".to_string(),
            source_title: "Example".to_string(),
            created_at,
            summary_options: Some(SummaryOptions::new(SummaryFormat::Tldr, DetailLevel::Low)),
            summary: None,
        }
    }

    #[test]
    fn expired_record_reads_absent_and_is_purged() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        store.put(&record("old", 1_000)).expect("put");

        let ten_minutes_later = 1_000 + 600_000 + 1;
        assert_eq!(store.get_at(ten_minutes_later).expect("get"), Lookup::Expired);
        assert_eq!(store.get_at(ten_minutes_later).expect("get"), Lookup::Empty);
        assert!(!store.path().exists());
    }

    #[test]
    fn record_at_exact_ttl_is_still_live() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        store.put(&record("edge", 1_000)).expect("put");
        assert!(matches!(
            store.get_at(1_000 + 600_000).expect("get"),
            Lookup::Present(_)
        ));
    }

    #[test]
    fn put_overwrites_last_write_wins() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        store.put(&record("first", 10)).expect("put1");
        store.put(&record("second", 20)).expect("put2");
        let Lookup::Present(got) = store.get_at(30).expect("get") else {
            panic!("expected record");
        };
        assert_eq!(got.text, "second");
    }

    #[test]
    fn stale_acknowledgement_keeps_newer_handoff() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        store.put(&record("first", 10)).expect("put1");
        store.put(&record("second", 20)).expect("put2");

        assert!(!store.acknowledge(10).expect("ack stale"));
        assert!(matches!(store.get_at(30).expect("get"), Lookup::Present(_)));
        assert!(store.acknowledge(20).expect("ack"));
        assert_eq!(store.get_at(30).expect("get"), Lookup::Empty);
    }

    #[test]
    fn attach_summary_only_targets_matching_record() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        store.put(&record("text", 10)).expect("put");
        let summary = SummaryResponse {
            summary: "short".to_string(),
            original_length: 4,
            summary_length: 5,
            format: SummaryFormat::Tldr,
        };
        assert!(!store.attach_summary(99, &summary).expect("attach other"));
        assert!(store.attach_summary(10, &summary).expect("attach"));
        let Lookup::Present(got) = store.get_at(11).expect("get") else {
            panic!("expected record");
        };
        assert_eq!(got.summary, Some(summary));
    }

    #[test]
    fn corrupt_slot_reads_empty() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        std::fs::write(store.path(), "{not json").expect("write");
        assert_eq!(store.get_at(0).expect("get"), Lookup::Empty);
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_on_empty_slot_is_fine() {
        let tmp = tempdir().expect("tempdir");
        let store = EphemeralStore::open(tmp.path(), DEFAULT_HANDOFF_TTL);
        assert!(!store.clear().expect("clear"));
    }
}
