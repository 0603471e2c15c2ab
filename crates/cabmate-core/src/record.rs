//! Canonical travel record produced from the feed.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest when deriving an id.
const ID_HEX_LEN: usize = 16;

/// Content-derived record identity.
///
/// Derived from `name|travelDate|place`, so the same traveller submitting the
/// same trip keeps the same id across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Derive the id for a `(name, travel_date, place)` triple. Inputs are trimmed.
    pub fn derive(name: &str, travel_date: &str, place: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.trim().as_bytes());
        hasher.update(b"|");
        hasher.update(travel_date.trim().as_bytes());
        hasher.update(b"|");
        hasher.update(place.trim().as_bytes());
        let mut hex = format!("{:x}", hasher.finalize());
        hex.truncate(ID_HEX_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

/// One traveller's submitted plan.
///
/// Every field except `id` is free-form text as it appeared in the feed,
/// trimmed. `name`, `travel_date` and `place` are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRecord {
    pub id: RecordId,
    pub timestamp: String,
    pub email: String,
    pub name: String,
    pub contact: String,
    /// Compared by exact string equality, never parsed as a date.
    pub travel_date: String,
    /// `HH:MM[:SS]`, or blank / a sentinel for a flexible departure.
    pub departure_time: String,
    pub place: String,
    pub flight_train_number: String,
}

/// Field values collected for one row before admission.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub timestamp: String,
    pub email: String,
    pub name: String,
    pub contact: String,
    pub travel_date: String,
    pub departure_time: String,
    pub place: String,
    pub flight_train_number: String,
}

impl RecordDraft {
    /// Apply the admission filter: trim every field and build a record only if
    /// `name`, `travel_date` and `place` are all non-empty.
    pub fn admit(self) -> Option<TravelRecord> {
        let name = self.name.trim().to_string();
        let travel_date = self.travel_date.trim().to_string();
        let place = self.place.trim().to_string();
        if name.is_empty() || travel_date.is_empty() || place.is_empty() {
            return None;
        }

        Some(TravelRecord {
            id: RecordId::derive(&name, &travel_date, &place),
            timestamp: self.timestamp.trim().to_string(),
            email: self.email.trim().to_string(),
            name,
            contact: self.contact.trim().to_string(),
            travel_date,
            departure_time: self.departure_time.trim().to_string(),
            place,
            flight_train_number: self.flight_train_number.trim().to_string(),
        })
    }
}
