use std::time::Duration;

use cabmate_core::{RecordId, ValidationError};
use thiserror::Error;

/// Failure reaching the upstream feed.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Transport(String),

    #[error("feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(#[from] FetchError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("no record with id {0}")]
    UnknownRecord(RecordId),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
