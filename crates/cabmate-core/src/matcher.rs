//! Partner matching: who else travels to the same place, on the same date, at
//! a compatible time.
//!
//! A candidate is compatible with the target when all of these hold:
//!
//! 1. It is not the target itself (compared by id, not by name).
//! 2. Places are equal after trimming and lowercasing.
//! 3. Travel dates are byte-identical. No date parsing is done.
//! 4. Either side has a flexible departure, or both have fixed times with
//!    `-before <= candidate - target <= after` (minutes, bounds inclusive).
//!    An unparseable time on a side that is not flexible never matches.
//!
//! Times are minute offsets within one day; windows crossing midnight are not
//! wrapped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::departure::DepartureTime;
use crate::record::{RecordId, TravelRecord};

/// Tolerance around the target's departure, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWindow {
    /// How much earlier a candidate may leave.
    pub before_minutes: u32,
    /// How much later a candidate may leave.
    pub after_minutes: u32,
}

impl MatchWindow {
    pub const fn custom(before_minutes: u32, after_minutes: u32) -> Self {
        Self {
            before_minutes,
            after_minutes,
        }
    }

    /// ±30 minutes.
    pub const fn tight() -> Self {
        Self::custom(30, 30)
    }

    pub const fn one_hour() -> Self {
        Self::custom(60, 60)
    }

    pub const fn two_hours() -> Self {
        Self::custom(120, 120)
    }

    /// Two hours before to one hour after.
    pub const fn legacy() -> Self {
        Self::custom(120, 60)
    }

    /// Whether a signed `candidate - target` offset falls inside the window.
    pub fn contains(&self, diff_minutes: i32) -> bool {
        let before = -i64::from(self.before_minutes);
        let after = i64::from(self.after_minutes);
        (before..=after).contains(&i64::from(diff_minutes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// The side of a partner search being matched against.
///
/// Built from a stored record, or from fields a caller supplied directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTarget {
    /// Excluded from results when present.
    pub id: Option<RecordId>,
    pub travel_date: String,
    pub departure_time: String,
    pub place: String,
}

impl MatchTarget {
    /// Reject targets without a travel date or place.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.travel_date.trim().is_empty() {
            missing.push("travelDate");
        }
        if self.place.trim().is_empty() {
            missing.push("place");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }
}

impl From<&TravelRecord> for MatchTarget {
    fn from(record: &TravelRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            travel_date: record.travel_date.clone(),
            departure_time: record.departure_time.clone(),
            place: record.place.clone(),
        }
    }
}

/// A compatible candidate and its departure offset from the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    #[serde(flatten)]
    pub record: TravelRecord,
    /// `candidate - target` in minutes; `None` when either side is flexible.
    pub offset_minutes: Option<i32>,
}

/// Compatible candidates from `pool`, in pool order, at most `limit` of them.
pub fn find_partners(
    target: &MatchTarget,
    pool: &[TravelRecord],
    window: MatchWindow,
    limit: usize,
) -> Vec<Partner> {
    let place = place_key(&target.place);
    let date = target.travel_date.as_str();
    let target_time = DepartureTime::classify(&target.departure_time);

    pool.iter()
        .filter(|c| target.id.as_ref() != Some(&c.id))
        .filter(|c| place_key(&c.place) == place)
        .filter(|c| c.travel_date == date)
        .filter_map(|c| {
            let candidate_time = DepartureTime::classify(&c.departure_time);
            time_offset(target_time, candidate_time, window).map(|offset_minutes| Partner {
                record: c.clone(),
                offset_minutes,
            })
        })
        .take(limit)
        .collect()
}

/// `Some(offset)` when compatible; the inner value is `None` for a flexible match.
fn time_offset(
    target: DepartureTime,
    candidate: DepartureTime,
    window: MatchWindow,
) -> Option<Option<i32>> {
    match (target, candidate) {
        (DepartureTime::Flexible, _) | (_, DepartureTime::Flexible) => Some(None),
        (DepartureTime::At(t), DepartureTime::At(c)) => {
            let diff = c.minutes_since(t);
            window.contains(diff).then_some(Some(diff))
        }
        _ => None,
    }
}

fn place_key(place: &str) -> String {
    place.trim().to_lowercase()
}

/// Whether two place strings name the same destination for matching.
pub fn same_place(a: &str, b: &str) -> bool {
    place_key(a) == place_key(b)
}
