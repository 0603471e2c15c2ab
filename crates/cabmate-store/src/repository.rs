//! Durable copies of the record set.
//!
//! The cache works without one; a repository only lets a restarted process
//! serve the last known records before its first successful fetch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cabmate_core::TravelRecord;
use tokio::sync::Mutex;
use tracing::debug;

use crate::RepositoryError;

#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Replace the stored set with `records`.
    async fn replace_all(&self, records: &[TravelRecord]) -> Result<(), RepositoryError>;

    async fn load_all(&self) -> Result<Vec<TravelRecord>, RepositoryError>;
}

/// In-process repository.
#[derive(Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<TravelRecord>>,
    writes: AtomicUsize,
}

impl MemoryRepository {
    /// Number of `replace_all` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordRepository for MemoryRepository {
    async fn replace_all(&self, records: &[TravelRecord]) -> Result<(), RepositoryError> {
        *self.records.lock().await = records.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<TravelRecord>, RepositoryError> {
        Ok(self.records.lock().await.clone())
    }
}

/// JSON array on disk.
///
/// Writes go to a sibling `.tmp` file that is renamed over the target, so a
/// crash mid-write leaves the previous file intact.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordRepository for JsonFileRepository {
    async fn replace_all(&self, records: &[TravelRecord]) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = records.len(), "wrote record file");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<TravelRecord>, RepositoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabmate_core::RecordDraft;

    fn records() -> Vec<TravelRecord> {
        ["Asha", "Ravi"]
            .iter()
            .map(|name| {
                RecordDraft {
                    name: (*name).into(),
                    travel_date: "2024-01-15".into(),
                    place: "Airport".into(),
                    ..Default::default()
                }
                .admit()
                .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn memory_round_trip() {
        let repo = MemoryRepository::default();
        assert!(repo.load_all().await.unwrap().is_empty());
        repo.replace_all(&records()).await.unwrap();
        assert_eq!(repo.load_all().await.unwrap(), records());
        assert_eq!(repo.writes(), 1);
    }

    #[tokio::test]
    async fn json_file_missing_loads_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let repo = JsonFileRepository::new(tmp.path().join("records.json"));
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_file_replace_and_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("records.json");

        let repo = JsonFileRepository::new(&path);
        repo.replace_all(&records()).await.unwrap();
        assert!(path.exists());
        assert!(!repo.tmp_path().exists());
        drop(repo);

        let reopened = JsonFileRepository::new(&path);
        assert_eq!(reopened.load_all().await.unwrap(), records());

        reopened.replace_all(&records()[..1]).await.unwrap();
        assert_eq!(reopened.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn json_file_corrupt_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("records.json");
        std::fs::write(&path, b"not json").unwrap();

        let repo = JsonFileRepository::new(&path);
        assert!(matches!(
            repo.load_all().await,
            Err(RepositoryError::Json(_))
        ));
    }
}
