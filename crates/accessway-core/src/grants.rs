use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Target;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrantRecord {
    pub subject: String,
    pub target: Target,
    pub granted_at: String,
    #[serde(default)]
    pub state: BTreeMap<String, Value>,
}

pub trait GrantStore {
    fn get(&self, subject: &str, target: &Target) -> Option<GrantRecord>;
    fn put(&mut self, record: GrantRecord);
    fn list(&self) -> Vec<GrantRecord>;
    fn delete(&mut self, subject: &str, target: &Target) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    records: Vec<GrantRecord>,
}

#[derive(Debug)]
pub struct FileGrantStore {
    path: PathBuf,
    records: Vec<GrantRecord>,
}

impl FileGrantStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let path = path.into();
        let records = load_records(&path)?;
        Ok(Self { path, records })
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from(".accessway/grants.json")
    }

    fn persist(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&self.records).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl GrantStore for InMemoryGrantStore {
    fn get(&self, subject: &str, target: &Target) -> Option<GrantRecord> {
        self.records
            .iter()
            .find(|record| record.subject == subject && record.target == *target)
            .cloned()
    }

    fn put(&mut self, record: GrantRecord) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|item| item.subject == record.subject && item.target == record.target)
        {
            *existing = record;
        } else {
            self.records.push(record);
        }
    }

    fn list(&self) -> Vec<GrantRecord> {
        self.records.clone()
    }

    fn delete(&mut self, subject: &str, target: &Target) -> bool {
        let initial_len = self.records.len();
        self.records
            .retain(|record| !(record.subject == subject && record.target == *target));
        initial_len != self.records.len()
    }
}

impl GrantStore for FileGrantStore {
    fn get(&self, subject: &str, target: &Target) -> Option<GrantRecord> {
        self.records
            .iter()
            .find(|record| record.subject == subject && record.target == *target)
            .cloned()
    }

    fn put(&mut self, record: GrantRecord) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|item| item.subject == record.subject && item.target == record.target)
        {
            *existing = record;
        } else {
            self.records.push(record);
        }
        let _ = self.persist();
    }

    fn list(&self) -> Vec<GrantRecord> {
        self.records.clone()
    }

    fn delete(&mut self, subject: &str, target: &Target) -> bool {
        let initial_len = self.records.len();
        self.records
            .retain(|record| !(record.subject == subject && record.target == *target));
        let removed = initial_len != self.records.len();
        if removed {
            let _ = self.persist();
        }
        removed
    }
}

fn load_records(path: &Path) -> Result<Vec<GrantRecord>, std::io::Error> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let records = serde_json::from_str(&contents)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    Ok(records)
}

pub fn timestamp_label() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}-{}", now.as_secs(), now.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str, environment: &str) -> GrantRecord {
        GrantRecord {
            subject: subject.to_string(),
            target: Target::new("Environment").argument("environment", environment),
            granted_at: timestamp_label(),
            state: BTreeMap::new(),
        }
    }

    #[test]
    fn put_upserts_matching_record() {
        let mut store = InMemoryGrantStore::default();
        store.put(record("user@example.com", "staging"));
        store.put(record("user@example.com", "staging"));
        assert_eq!(store.list().len(), 1);

        store.put(record("user@example.com", "production"));
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn delete_reports_whether_record_existed() {
        let mut store = InMemoryGrantStore::default();
        let rec = record("user@example.com", "staging");
        store.put(rec.clone());

        assert!(store.delete(&rec.subject, &rec.target));
        assert!(!store.delete(&rec.subject, &rec.target));
    }

    #[test]
    fn file_store_persists_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("grants.json");

        let rec = record("user@example.com", "staging");
        {
            let mut store = FileGrantStore::new(&path).expect("failed to open store");
            store.put(rec.clone());
        }

        let store = FileGrantStore::new(&path).expect("failed to reopen store");
        let stored = store
            .get(&rec.subject, &rec.target)
            .expect("missing record");
        assert_eq!(stored, rec);
    }

    #[test]
    fn file_store_starts_empty_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store =
            FileGrantStore::new(dir.path().join("grants.json")).expect("failed to open store");
        assert!(store.list().is_empty());
    }
}
