//! Parser for the travel-plan spreadsheet export.
//!
//! The export is comma-delimited text with a header row, but it is not
//! well-formed CSV. Two known quirks of this particular feed are repaired
//! here; nothing else is attempted:
//!
//! 1. The header row is sometimes wrapped immediately before the `Place`
//!    column, leaving a continuation line that starts with `Place"`. The
//!    continuation is folded back into the header.
//! 2. If the header still names a quoted `Place` column but lacks the
//!    `Flight/train number` column, the wrapped header lost its tail and the
//!    fixed [`CANONICAL_HEADER`] is used instead.
//!
//! Fields are split on commas outside double quotes. Quote characters only
//! toggle the quoted state and are dropped; escaped quotes (`""`) are not
//! recognised. Rows failing the arity check or the admission filter are
//! dropped silently and counted in the [`ParseReport`].

use tracing::debug;

use crate::record::{RecordDraft, TravelRecord};

/// Column list of the live feed, used when the header row cannot be trusted.
pub const CANONICAL_HEADER: &[&str] = &[
    "Timestamp",
    "Email address",
    "Name",
    "Contact Number",
    "Travel Date",
    "Departure time from the location",
    "Place",
    "Flight/train number (optional)",
    "Column 9",
];

const FLIGHT_MARKER: &str = "Flight/train number";
const QUOTED_PLACE: &str = "Place\"";

/// How rows whose field count differs from the header are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArityPolicy {
    /// Field count must equal the header's.
    #[default]
    Strict,
    /// Field count must be at least the header's; trailing fields are ignored.
    Lenient,
}

impl ArityPolicy {
    fn accepts(self, fields: usize, header: usize) -> bool {
        match self {
            Self::Strict => fields == header,
            Self::Lenient => fields >= header,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub arity: ArityPolicy,
}

/// Outcome of one parse, including what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Header columns the rows were zipped against.
    pub header: Vec<String>,
    /// True when the canonical header replaced the feed's own.
    pub header_repaired: bool,
    pub rows_seen: usize,
    pub rejected_arity: usize,
    pub rejected_admission: usize,
    pub records: Vec<TravelRecord>,
}

/// Parse raw feed text into admitted records, in feed order.
pub fn parse(raw: &str, options: &ParseOptions) -> Vec<TravelRecord> {
    parse_with_report(raw, options).records
}

pub fn parse_with_report(raw: &str, options: &ParseOptions) -> ParseReport {
    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return ParseReport::default();
    }

    let (header_text, data_start) = join_wrapped_header(&lines);
    let header_repaired =
        header_text.contains(QUOTED_PLACE) && !header_text.contains(FLIGHT_MARKER);
    let header: Vec<String> = if header_repaired {
        debug!("feed header wrapped before Place; using canonical header");
        CANONICAL_HEADER.iter().map(|h| h.to_string()).collect()
    } else {
        split_fields(&header_text)
    };
    let columns: Vec<Option<Column>> = header.iter().map(|h| Column::from_header(h)).collect();

    let mut report = ParseReport {
        header,
        header_repaired,
        ..Default::default()
    };

    for line in &lines[data_start..] {
        report.rows_seen += 1;
        let fields = split_fields(line);
        if !options.arity.accepts(fields.len(), columns.len()) {
            report.rejected_arity += 1;
            continue;
        }

        let mut draft = RecordDraft::default();
        for (column, value) in columns.iter().zip(fields) {
            if let Some(column) = column {
                column.fill(&mut draft, value);
            }
        }

        match draft.admit() {
            Some(record) => report.records.push(record),
            None => report.rejected_admission += 1,
        }
    }

    debug!(
        records = report.records.len(),
        rows = report.rows_seen,
        rejected_arity = report.rejected_arity,
        rejected_admission = report.rejected_admission,
        "parsed feed"
    );
    report
}

/// Fold a `Place"...` continuation line into the header.
///
/// Returns the header text and the index of the first data line.
fn join_wrapped_header(lines: &[&str]) -> (String, usize) {
    let first = lines[0];
    let continues = lines.get(1).is_some_and(|next| {
        let next = next.trim_start();
        next.starts_with(QUOTED_PLACE) || next.starts_with("\"Place\"")
    });
    if continues && !first.contains(FLIGHT_MARKER) {
        (format!("{}{}", first.trim_end(), lines[1].trim_start()), 2)
    } else {
        (first.to_string(), 1)
    }
}

/// Split one line on commas outside double quotes. Fields are trimmed.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Record attribute a header column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Timestamp,
    Email,
    Name,
    Contact,
    TravelDate,
    DepartureTime,
    Place,
    FlightTrainNumber,
}

impl Column {
    /// Map a header name, including the variants seen in past exports.
    fn from_header(header: &str) -> Option<Self> {
        let h = header.trim().to_ascii_lowercase();
        let column = match h.as_str() {
            "timestamp" => Self::Timestamp,
            "email address" | "email" => Self::Email,
            "name" => Self::Name,
            "contact number" | "contact" => Self::Contact,
            "travel date" => Self::TravelDate,
            "departure time from the location" | "departure time" => Self::DepartureTime,
            "place" => Self::Place,
            "flight/train number (optional)" | "flight/train number" => Self::FlightTrainNumber,
            _ => return None,
        };
        Some(column)
    }

    /// First non-empty value wins when two header variants map to one column.
    fn fill(self, draft: &mut RecordDraft, value: String) {
        let slot = match self {
            Self::Timestamp => &mut draft.timestamp,
            Self::Email => &mut draft.email,
            Self::Name => &mut draft.name,
            Self::Contact => &mut draft.contact,
            Self::TravelDate => &mut draft.travel_date,
            Self::DepartureTime => &mut draft.departure_time,
            Self::Place => &mut draft.place,
            Self::FlightTrainNumber => &mut draft.flight_train_number,
        };
        if slot.is_empty() {
            *slot = value;
        }
    }
}
