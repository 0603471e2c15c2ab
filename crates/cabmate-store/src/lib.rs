//! Record store: change-detecting cache over the travel feed, optional
//! persistence, and the operations exposed to transports.

mod cache;
mod clock;
mod error;
mod repository;
mod service;
mod source;

#[cfg(test)]
mod testing;

pub use cache::{RecordStore, Snapshot, StoreConfig};
pub use clock::{Clock, SystemClock};
pub use error::{FetchError, RepositoryError, StoreError};
pub use repository::{JsonFileRepository, MemoryRepository, RecordRepository};
pub use service::{
    HealthReport, PartnerRequest, PartnerResults, RecordsSnapshot, ServiceConfig, TargetSpec,
    TravelService, UpdateStatus,
};
pub use source::FeedSource;
