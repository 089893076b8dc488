//! Persistence for the single current record.
//!
//! There is only ever one stored record; every successful run replaces it
//! and no history is kept. [`JsonFileStore`] keeps it as one JSON document:
//!
//! ```json
//! { "updated_at": "2026-10-14T09:30:00+00:00", "record": { "news_title": "...", ... } }
//! ```

use crate::error::StoreError;
use crate::models::MergedRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// The persisted record and when it was written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredRecord {
    /// RFC 3339 UTC timestamp of the upsert.
    pub updated_at: String,
    pub record: MergedRecord,
}

/// Holds the one current [`MergedRecord`].
pub trait RecordStore {
    /// Replace the stored record, creating it if absent.
    async fn upsert_singleton(&self, record: &MergedRecord) -> Result<(), StoreError>;

    /// The stored record, or [`StoreError::NotFound`] if nothing was stored yet.
    async fn get_singleton_or_fail(&self) -> Result<StoredRecord, StoreError>;
}

/// A [`RecordStore`] backed by one JSON file.
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

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Create `dir` if needed and check that files can be written in it.
#[instrument(level = "debug", skip_all, fields(dir = %dir.display()))]
async fn ensure_writable_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).await?;
    let marker = dir.join(".mars_scrape_write_check");
    fs::write(&marker, b"").await?;
    fs::remove_file(&marker).await?;
    Ok(())
}

impl RecordStore for JsonFileStore {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn upsert_singleton(&self, record: &MergedRecord) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            ensure_writable_dir(dir).await?;
        }

        let stored = StoredRecord {
            updated_at: Utc::now().to_rfc3339(),
            record: record.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        // Readers only ever see the old or the new document.
        let staging = self.staging_path();
        fs::write(&staging, json).await?;
        fs::rename(&staging, &self.path).await?;

        info!(updated_at = %stored.updated_at, "Stored record");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn get_singleton_or_fail(&self) -> Result<StoredRecord, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// A [`RecordStore`] kept in memory, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub current: std::sync::Mutex<Option<StoredRecord>>,
    pub writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl RecordStore for MemoryStore {
    async fn upsert_singleton(&self, record: &MergedRecord) -> Result<(), StoreError> {
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.current.lock().unwrap() = Some(StoredRecord {
            updated_at: Utc::now().to_rfc3339(),
            record: record.clone(),
        });
        Ok(())
    }

    async fn get_singleton_or_fail(&self) -> Result<StoredRecord, StoreError> {
        self.current.lock().unwrap().clone().ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;

    fn record(title: &str) -> MergedRecord {
        MergedRecord {
            news_title: title.to_string(),
            ..MergedRecord::fallback(&ScrapeConfig::default())
        }
    }

    #[tokio::test]
    async fn test_get_before_first_upsert_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("mars.json"));
        assert!(matches!(
            store.get_singleton_or_fail().await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/mars.json"));

        store.upsert_singleton(&record("first")).await.unwrap();
        store.upsert_singleton(&record("second")).await.unwrap();

        let stored = store.get_singleton_or_fail().await.unwrap();
        assert_eq!(stored.record.news_title, "second");
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.updated_at).is_ok());

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("mars.json")]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mars.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get_singleton_or_fail().await,
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_staging_path_is_sibling() {
        let store = JsonFileStore::new("/var/lib/mars/mars.json");
        assert_eq!(
            store.staging_path(),
            PathBuf::from("/var/lib/mars/mars.json.tmp")
        );
    }
}
