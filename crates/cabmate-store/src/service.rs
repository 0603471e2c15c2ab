//! Operations a transport layer wraps: list records, poll for changes,
//! find partners, search, health.

use std::sync::Arc;

use cabmate_core::{
    Fingerprint, MatchTarget, MatchWindow, Partner, RecordFilter, RecordId, TravelRecord,
    find_partners, same_place,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{RecordStore, Snapshot, StoreError};

/// Policy defaults applied when a request leaves them out.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub default_window: MatchWindow,
    pub partner_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_window: MatchWindow::tight(),
            partner_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsSnapshot {
    pub records: Arc<Vec<TravelRecord>>,
    pub count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub fingerprint: Option<Fingerprint>,
}

impl From<Snapshot> for RecordsSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            count: snapshot.records.len(),
            records: snapshot.records,
            fetched_at: snapshot.fetched_at,
            fingerprint: snapshot.fingerprint,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub has_changed: bool,
    pub current_fingerprint: Option<Fingerprint>,
    pub record_count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Who to find partners for.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    /// A record in the current set.
    ById(RecordId),
    /// Trip details supplied by the caller. With a name, the caller's own
    /// record (same trimmed name and date, same place as the matcher sees
    /// it) is recognised and excluded.
    ByFields {
        name: Option<String>,
        travel_date: String,
        departure_time: String,
        place: String,
    },
}

#[derive(Debug, Clone)]
pub struct PartnerRequest {
    pub target: TargetSpec,
    pub window: Option<MatchWindow>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerResults {
    pub partners: Vec<Partner>,
    pub count: usize,
    pub window: MatchWindow,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub record_count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub fingerprint: Option<Fingerprint>,
    pub stale: bool,
}

pub struct TravelService {
    store: Arc<RecordStore>,
    config: ServiceConfig,
}

impl TravelService {
    pub fn new(store: Arc<RecordStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// All records, refreshed per the store's freshness policy.
    pub async fn get_records(&self) -> Result<RecordsSnapshot, StoreError> {
        Ok(self.store.get_or_refresh(false).await?.into())
    }

    /// All records after an unconditional fetch.
    pub async fn refresh(&self) -> Result<RecordsSnapshot, StoreError> {
        Ok(self.store.get_or_refresh(true).await?.into())
    }

    /// Compare a caller's fingerprint with the current one.
    ///
    /// Only fetches when the store's own policy says so. A caller with no
    /// fingerprint has changed data as soon as the store has any.
    pub async fn check_for_updates(&self, caller: Option<&str>) -> Result<UpdateStatus, StoreError> {
        let snapshot = self.store.get_or_refresh(false).await?;
        let caller = caller.map(str::trim).filter(|c| !c.is_empty());
        let has_changed = match (&snapshot.fingerprint, caller) {
            (Some(current), Some(caller)) => !current.matches(caller),
            (None, None) => false,
            _ => true,
        };
        debug!(has_changed, "checked for updates");
        Ok(UpdateStatus {
            has_changed,
            current_fingerprint: snapshot.fingerprint,
            record_count: snapshot.records.len(),
            fetched_at: snapshot.fetched_at,
        })
    }

    /// Compatible partners for a stored record or caller-supplied trip.
    ///
    /// Caller-supplied trips without a travel date or place are rejected
    /// before the cache is consulted.
    pub async fn find_partners(&self, request: PartnerRequest) -> Result<PartnerResults, StoreError> {
        let window = request.window.unwrap_or(self.config.default_window);
        let limit = request.limit.unwrap_or(self.config.partner_limit);

        let snapshot;
        let target = match request.target {
            TargetSpec::ByFields {
                name,
                travel_date,
                departure_time,
                place,
            } => {
                let mut target = MatchTarget {
                    id: None,
                    travel_date: travel_date.trim().to_string(),
                    departure_time: departure_time.trim().to_string(),
                    place: place.trim().to_string(),
                };
                target.validate()?;
                snapshot = self.store.get_or_refresh(false).await?;
                if let Some(name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                    target.id = snapshot
                        .records
                        .iter()
                        .find(|r| {
                            r.name == name
                                && r.travel_date == target.travel_date
                                && same_place(&r.place, &target.place)
                        })
                        .map(|r| r.id.clone());
                }
                target
            }
            TargetSpec::ById(id) => {
                snapshot = self.store.get_or_refresh(false).await?;
                let record = snapshot
                    .records
                    .iter()
                    .find(|r| r.id == id)
                    .ok_or(StoreError::UnknownRecord(id))?;
                MatchTarget::from(record)
            }
        };

        let partners = find_partners(&target, &snapshot.records, window, limit);
        info!(
            count = partners.len(),
            before = window.before_minutes,
            after = window.after_minutes,
            "found partners"
        );
        Ok(PartnerResults {
            count: partners.len(),
            partners,
            window,
        })
    }

    /// Filtered, de-duplicated records.
    pub async fn search(&self, filter: &RecordFilter) -> Result<Vec<TravelRecord>, StoreError> {
        let snapshot = self.store.get_or_refresh(false).await?;
        Ok(filter.apply(&snapshot.records))
    }

    /// Cache state without fetching.
    pub async fn health(&self) -> HealthReport {
        let snapshot = self.store.snapshot().await;
        HealthReport {
            record_count: snapshot.records.len(),
            fetched_at: snapshot.fetched_at,
            fingerprint: snapshot.fingerprint,
            stale: self.store.is_stale().await,
        }
    }
}
