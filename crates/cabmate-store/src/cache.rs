//! Change-detecting cache over the travel feed.
//!
//! The store keeps the last admitted record set, its fingerprint, and when the
//! feed was last fetched successfully. A fetch happens when the cache is
//! empty, older than the freshness window, or a caller forces it.
//!
//! `fetched_at` moves on every successful fetch; the record set is only
//! replaced when the fingerprint changes. A failed fetch leaves the cache as
//! it was.
//!
//! At most one fetch runs per store. Callers that queue behind a running
//! fetch take its outcome, records or error, instead of issuing their own.

use std::sync::Arc;
use std::time::Duration;

use cabmate_core::{Fingerprint, ParseOptions, TravelRecord, fingerprint_records, parse_with_report};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{Clock, FeedSource, FetchError, RecordRepository, StoreError};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a successful fetch counts as fresh.
    pub freshness: Duration,
    /// Upper bound on one upstream fetch.
    pub fetch_timeout: Duration,
    pub parse: ParseOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            freshness: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            parse: ParseOptions::default(),
        }
    }
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Shared with the cache; the same allocation until content changes.
    pub records: Arc<Vec<TravelRecord>>,
    pub fingerprint: Option<Fingerprint>,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheState {
    records: Arc<Vec<TravelRecord>>,
    fingerprint: Option<Fingerprint>,
    fetched_at: Option<DateTime<Utc>>,
    /// Bumped when a fetch attempt finishes, whether or not it succeeded.
    attempts: u64,
    /// Error from the latest attempt; cleared by a successful one.
    last_error: Option<FetchError>,
}

impl CacheState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: Arc::clone(&self.records),
            fingerprint: self.fingerprint.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

pub struct RecordStore {
    source: Arc<dyn FeedSource>,
    clock: Arc<dyn Clock>,
    repository: Option<Arc<dyn RecordRepository>>,
    config: StoreConfig,
    state: RwLock<CacheState>,
    refresh: Mutex<()>,
}

impl RecordStore {
    pub fn new(source: Arc<dyn FeedSource>, clock: Arc<dyn Clock>, config: StoreConfig) -> Self {
        Self {
            source,
            clock,
            repository: None,
            config,
            state: RwLock::new(CacheState::default()),
            refresh: Mutex::new(()),
        }
    }

    /// Mirror every content change into `repository`.
    pub fn with_repository(mut self, repository: Arc<dyn RecordRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Seed the cache from the repository.
    ///
    /// Loaded records are served but not considered fresh, so the next read
    /// still fetches. Returns the number of records loaded.
    pub async fn warm_start(&self) -> Result<usize, StoreError> {
        let Some(repository) = &self.repository else {
            return Ok(0);
        };
        let records = repository.load_all().await?;
        let count = records.len();
        if count > 0 {
            let mut state = self.state.write().await;
            if state.fetched_at.is_none() {
                state.fingerprint = Some(fingerprint_records(&records));
                state.records = Arc::new(records);
            }
        }
        info!(count, "warm start from repository");
        Ok(count)
    }

    /// Current cache contents, without fetching.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot()
    }

    /// Whether the next non-forced read would fetch.
    pub async fn is_stale(&self) -> bool {
        let state = self.state.read().await;
        self.needs_refresh(&state)
    }

    /// Return the cached records, fetching first when stale, empty, or `force`d.
    pub async fn get_or_refresh(&self, force: bool) -> Result<Snapshot, StoreError> {
        let observed = {
            let state = self.state.read().await;
            if !force && !self.needs_refresh(&state) {
                return Ok(state.snapshot());
            }
            state.attempts
        };

        let _in_flight = self.refresh.lock().await;
        {
            let state = self.state.read().await;
            if state.attempts != observed {
                debug!(failed = state.last_error.is_some(), "served by concurrent refresh");
                return match &state.last_error {
                    Some(e) => Err(e.clone().into()),
                    None => Ok(state.snapshot()),
                };
            }
        }
        self.refresh_locked().await
    }

    fn needs_refresh(&self, state: &CacheState) -> bool {
        if state.records.is_empty() {
            return true;
        }
        match state.fetched_at {
            None => true,
            Some(fetched_at) => self
                .clock
                .now()
                .signed_duration_since(fetched_at)
                .to_std()
                .is_ok_and(|age| age > self.config.freshness),
        }
    }

    /// Fetch, parse, and swap in new records. Caller holds `refresh`.
    async fn refresh_locked(&self) -> Result<Snapshot, StoreError> {
        let raw = match self.fetch_bounded().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "feed fetch failed; cache left unchanged");
                let mut state = self.state.write().await;
                state.attempts += 1;
                state.last_error = Some(e.clone());
                return Err(e.into());
            }
        };

        let report = parse_with_report(&raw, &self.config.parse);
        if report.header_repaired {
            info!("feed header was wrapped; parsed with canonical columns");
        }
        let fingerprint = fingerprint_records(&report.records);
        let now = self.clock.now();

        let (changed, snapshot) = {
            let mut state = self.state.write().await;
            let changed = state.fingerprint.as_ref() != Some(&fingerprint);
            if changed {
                info!(
                    count = report.records.len(),
                    previous = state.records.len(),
                    rejected_arity = report.rejected_arity,
                    rejected_admission = report.rejected_admission,
                    fingerprint = %fingerprint,
                    "feed content changed"
                );
                state.records = Arc::new(report.records);
                state.fingerprint = Some(fingerprint);
            } else {
                debug!(count = state.records.len(), "feed content unchanged");
            }
            state.fetched_at = Some(now);
            state.attempts += 1;
            state.last_error = None;
            (changed, state.snapshot())
        };

        if changed {
            self.persist(&snapshot.records).await;
        }
        Ok(snapshot)
    }

    async fn fetch_bounded(&self) -> Result<String, FetchError> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.source.fetch_raw()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }

    async fn persist(&self, records: &[TravelRecord]) {
        let Some(repository) = &self.repository else {
            return;
        };
        match repository.replace_all(records).await {
            Ok(()) => debug!(count = records.len(), "mirrored records to repository"),
            Err(e) => warn!(error = %e, "failed to mirror records to repository"),
        }
    }
}
