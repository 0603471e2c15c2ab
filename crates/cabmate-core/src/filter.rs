//! Browsing filters over the record set.

use std::collections::HashSet;

use crate::record::TravelRecord;

/// Narrow the record list by free-text search, date and destination.
///
/// Blank criteria are ignored. Records sharing an id are collapsed to the
/// first occurrence before filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring of name, contact, place or flight/train number.
    pub search: Option<String>,
    /// Exact travel date string.
    pub date: Option<String>,
    /// Exact place string.
    pub destination: Option<String>,
}

impl RecordFilter {
    pub fn apply(&self, records: &[TravelRecord]) -> Vec<TravelRecord> {
        let search = non_blank(&self.search).map(|s| s.to_lowercase());
        let date = non_blank(&self.date);
        let destination = non_blank(&self.destination);

        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|r| seen.insert(r.id.clone()))
            .filter(|r| search.as_deref().is_none_or(|s| matches_search(r, s)))
            .filter(|r| date.is_none_or(|d| r.travel_date == d))
            .filter(|r| destination.is_none_or(|p| r.place == p))
            .cloned()
            .collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn matches_search(record: &TravelRecord, needle: &str) -> bool {
    [
        &record.name,
        &record.contact,
        &record.place,
        &record.flight_train_number,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Distinct travel dates in feed order.
pub fn distinct_dates(records: &[TravelRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.travel_date.as_str()))
}

/// Distinct places in feed order.
pub fn distinct_places(records: &[TravelRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.place.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordDraft;

    fn rec(name: &str, contact: &str, date: &str, place: &str, flight: &str) -> TravelRecord {
        RecordDraft {
            name: name.into(),
            contact: contact.into(),
            travel_date: date.into(),
            place: place.into(),
            flight_train_number: flight.into(),
            ..Default::default()
        }
        .admit()
        .unwrap()
    }

    fn sample() -> Vec<TravelRecord> {
        vec![
            rec("Asha Rao", "98765", "2024-01-15", "Airport", "6E 201"),
            rec("Ravi", "91234", "2024-01-15", "Railway Station", ""),
            rec("Meera", "90000", "2024-01-16", "Airport", "12627 Karnataka Exp"),
            rec("Asha Rao", "11111", "2024-01-15", "Airport", ""),
        ]
    }

    fn names(records: &[TravelRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn empty_filter_only_dedupes() {
        let out = RecordFilter::default().apply(&sample());
        assert_eq!(names(&out), vec!["Asha Rao", "Ravi", "Meera"]);
        // First occurrence wins.
        assert_eq!(out[0].contact, "98765");
    }

    #[test]
    fn search_spans_fields_case_insensitively() {
        let by_name = RecordFilter {
            search: Some("  asha ".into()),
            ..Default::default()
        };
        assert_eq!(names(&by_name.apply(&sample())), vec!["Asha Rao"]);

        let by_contact = RecordFilter {
            search: Some("9123".into()),
            ..Default::default()
        };
        assert_eq!(names(&by_contact.apply(&sample())), vec!["Ravi"]);

        let by_train = RecordFilter {
            search: Some("karnataka".into()),
            ..Default::default()
        };
        assert_eq!(names(&by_train.apply(&sample())), vec!["Meera"]);
    }

    #[test]
    fn date_and_destination_are_exact() {
        let f = RecordFilter {
            date: Some("2024-01-15".into()),
            destination: Some("Airport".into()),
            ..Default::default()
        };
        assert_eq!(names(&f.apply(&sample())), vec!["Asha Rao"]);

        let lower = RecordFilter {
            destination: Some("airport".into()),
            ..Default::default()
        };
        assert!(lower.apply(&sample()).is_empty());
    }

    #[test]
    fn blank_criteria_are_ignored() {
        let f = RecordFilter {
            search: Some("   ".into()),
            date: Some(String::new()),
            destination: None,
        };
        assert_eq!(f.apply(&sample()).len(), 3);
    }

    #[test]
    fn facets_keep_feed_order() {
        let records = sample();
        assert_eq!(distinct_dates(&records), vec!["2024-01-15", "2024-01-16"]);
        assert_eq!(distinct_places(&records), vec!["Airport", "Railway Station"]);
    }
}
