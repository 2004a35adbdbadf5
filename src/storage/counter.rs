use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Context, Result};

/// Durable count of upstream calls made during one UTC calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyQuotaRecord {
    /// `YYYY-MM` in UTC.
    #[serde(rename = "month")]
    pub month_key: String,
    pub count: u32,
}

impl MonthlyQuotaRecord {
    pub fn fresh(month_key: impl Into<String>) -> Self {
        Self {
            month_key: month_key.into(),
            count: 0,
        }
    }
}

/// Single-record persistence for the monthly counter.
pub trait CounterStore: Send + Debug {
    /// Read the stored record. Any failure, including a malformed record, reads as absent.
    fn load(&self) -> Option<MonthlyQuotaRecord>;

    /// Write the full record; it must be durable when this returns.
    fn save(&self, record: &MonthlyQuotaRecord) -> Result<()>;
}

/// Stores the record as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for JsonFileStore {
    fn load(&self) -> Option<MonthlyQuotaRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                log::warn!(
                    "Failed to read monthly counter {}: {}",
                    self.path.display(),
                    err
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!(
                    "Ignoring malformed monthly counter {}: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    fn save(&self, record: &MonthlyQuotaRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create counter directory {}", parent.display())
                })?;
            }
        }

        // Readers only ever see a complete record: stage, sync, then rename over the target.
        let staging = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&staging)
                .with_context(|| format!("Failed to create {}", staging.display()))?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("Failed to write {}", staging.display()))?;
            file.sync_all()
                .with_context(|| format!("Failed to sync {}", staging.display()))?;
        }
        fs::rename(&staging, &self.path).with_context(|| {
            format!("Failed to move counter into place at {}", self.path.display())
        })?;

        Ok(())
    }
}

/// Keeps the record in process memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<MonthlyQuotaRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: MonthlyQuotaRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CounterStore for MemoryStore {
    fn load(&self) -> Option<MonthlyQuotaRecord> {
        self.record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save(&self, record: &MonthlyQuotaRecord) -> Result<()> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileStore::new(dir.path().join("monthlyCounter.json"));

        assert_eq!(store.load(), None);
    }

    #[test]
    fn malformed_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("monthlyCounter.json");
        fs::write(&path, "{ \"month\": \"2025-11\", \"count\": -4 }").unwrap();

        assert_eq!(JsonFileStore::new(&path).load(), None);

        fs::write(&path, "not json").unwrap();
        assert_eq!(JsonFileStore::new(&path).load(), None);
    }

    #[test]
    fn saved_record_uses_month_field_and_reloads() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state").join("monthlyCounter.json");
        let store = JsonFileStore::new(&path);
        let record = MonthlyQuotaRecord {
            month_key: "2025-11".to_string(),
            count: 7,
        };

        store.save(&record).expect("save succeeds");

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["month"], "2025-11");
        assert_eq!(value["count"], 7);
        assert!(!path.with_extension("json.tmp").exists());

        assert_eq!(JsonFileStore::new(&path).load(), Some(record));
    }

    #[test]
    fn memory_store_keeps_last_saved_record() {
        let store = MemoryStore::new();
        assert_eq!(store.load(), None);

        let record = MonthlyQuotaRecord::fresh("2025-11");
        store.save(&record).unwrap();
        assert_eq!(store.load(), Some(record));
    }
}
