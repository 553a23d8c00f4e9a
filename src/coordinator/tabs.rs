use crate::coordinator::util::{read_optional, with_file_lock, write_json_atomic};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub type TabId = u64;

const TABS_FILE: &str = "tab_state.json";

/// Per-tab transient UI state. An entry is created by its first `set` and
/// destroyed when the tab closes or navigates; there is no wall-clock expiry.
#[derive(Debug, Clone)]
pub struct TabStateTable {
    path: PathBuf,
}

impl TabStateTable {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(TABS_FILE),
        }
    }

    fn load(&self) -> Result<BTreeMap<TabId, Value>> {
        let Some(raw) = read_optional(&self.path)? else {
            return Ok(BTreeMap::new());
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn update<T>(&self, f: impl FnOnce(&mut BTreeMap<TabId, Value>) -> T) -> Result<T> {
        with_file_lock(&self.path, || {
            let mut map = self.load()?;
            let out = f(&mut map);
            write_json_atomic(&self.path, &map)?;
            Ok(out)
        })
    }

    pub fn set(&self, tab: TabId, state: Value) -> Result<()> {
        self.update(|map| {
            map.insert(tab, state);
        })
    }

    pub fn get(&self, tab: TabId) -> Result<Option<Value>> {
        with_file_lock(&self.path, || Ok(self.load()?.remove(&tab)))
    }

    /// Tab closed.
    pub fn remove(&self, tab: TabId) -> Result<bool> {
        self.update(|map| map.remove(&tab).is_some())
    }

    /// Tab finished loading a new top-level document.
    pub fn invalidate(&self, tab: TabId) -> Result<bool> {
        self.update(|map| map.remove(&tab).is_some())
    }

    pub fn tabs(&self) -> Result<Vec<TabId>> {
        with_file_lock(&self.path, || Ok(self.load()?.into_keys().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn set_creates_entry_and_get_reads_it_back() {
        let tmp = tempdir().expect("tempdir");
        let table = TabStateTable::open(tmp.path());
        assert_eq!(table.get(7).expect("get"), None);

        table.set(7, json!({"lastSummary": "abc"})).expect("set");
        assert_eq!(
            table.get(7).expect("get"),
            Some(json!({"lastSummary": "abc"}))
        );
    }

    #[test]
    fn removal_and_navigation_evict_only_their_tab() {
        let tmp = tempdir().expect("tempdir");
        let table = TabStateTable::open(tmp.path());
        table.set(1, json!({"a": 1})).expect("set1");
        table.set(2, json!({"b": 2})).expect("set2");
        table.set(3, json!({"c": 3})).expect("set3");

        assert!(table.remove(1).expect("remove"));
        assert!(table.invalidate(2).expect("invalidate"));
        assert!(!table.invalidate(2).expect("invalidate twice"));
        assert_eq!(table.tabs().expect("tabs"), vec![3]);
    }

    #[test]
    fn state_survives_a_fresh_table_instance() {
        let tmp = tempdir().expect("tempdir");
        TabStateTable::open(tmp.path())
            .set(42, json!("collapsed"))
            .expect("set");
        let reopened = TabStateTable::open(tmp.path());
        assert_eq!(reopened.get(42).expect("get"), Some(json!("collapsed")));
    }
}
