//! Core types for CabMate: the travel record, the spreadsheet feed parser,
//! departure-time handling, partner matching, and record filters.

pub mod departure;
pub mod feed;
pub mod filter;
pub mod fingerprint;
pub mod matcher;
pub mod record;

pub use departure::{DepartureTime, MinuteOfDay};
pub use feed::{ArityPolicy, CANONICAL_HEADER, ParseOptions, ParseReport, parse, parse_with_report};
pub use filter::{RecordFilter, distinct_dates, distinct_places};
pub use fingerprint::{Fingerprint, fingerprint_records};
pub use matcher::{MatchTarget, MatchWindow, Partner, ValidationError, find_partners, same_place};
pub use record::{RecordDraft, RecordId, TravelRecord};
