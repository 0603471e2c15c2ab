//! Content fingerprint of a normalized record set.
//!
//! Hashes the records rather than the raw payload, so formatting churn in the
//! export (quoting, blank lines, rejected rows) does not register as a change.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::record::TravelRecord;

/// Lowercase hex SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a fingerprint supplied by a caller. Surrounding
    /// whitespace and hex case are ignored.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint_records(records: &[TravelRecord]) -> Fingerprint {
    let mut hasher = Sha256::new();
    // Serializing plain strings cannot fail; an empty input still hashes.
    let bytes = serde_json::to_vec(records).unwrap_or_default();
    hasher.update(&bytes);
    Fingerprint(format!("{:x}", hasher.finalize()))
}
