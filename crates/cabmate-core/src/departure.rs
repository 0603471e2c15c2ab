//! Departure time classification.
//!
//! The feed's departure column is free text. For matching it falls into one of
//! three cases:
//!
//! - Flexible: blank, or one of the sentinels `N/A` / `Not specified`
//! - Fixed: a well-formed `HH:MM` or `HH:MM:SS` on a 24-hour clock
//! - Invalid: anything else (`10am`, `25:00`, `ten:30`)
//!
//! Fixed times become minutes since midnight on a shared reference day.
//! Seconds are validated and then dropped.

/// Sentinel strings the feed uses for "no fixed time".
pub const FLEXIBLE_SENTINELS: &[&str] = &["N/A", "Not specified"];

/// Minutes since midnight, `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    /// Parse a strict `HH:MM[:SS]` string.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour = parse_component(parts.next()?, 23)?;
        let minute = parse_component(parts.next()?, 59)?;
        if let Some(sec) = parts.next() {
            parse_component(sec, 59)?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Signed offset `self - earlier` in minutes.
    pub fn minutes_since(self, other: MinuteOfDay) -> i32 {
        i32::from(self.0) - i32::from(other.0)
    }
}

fn parse_component(s: &str, max: u16) -> Option<u16> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let v: u16 = s.parse().ok()?;
    (v <= max).then_some(v)
}

/// A classified departure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureTime {
    Flexible,
    At(MinuteOfDay),
    Invalid,
}

impl DepartureTime {
    pub fn classify(raw: &str) -> Self {
        let t = raw.trim();
        if is_flexible(t) {
            return Self::Flexible;
        }
        match MinuteOfDay::parse(t) {
            Some(m) => Self::At(m),
            None => Self::Invalid,
        }
    }

    pub fn is_flexible(self) -> bool {
        matches!(self, Self::Flexible)
    }
}

/// Blank or sentinel. Sentinels are matched exactly after trimming.
pub fn is_flexible(raw: &str) -> bool {
    let t = raw.trim();
    t.is_empty() || FLEXIBLE_SENTINELS.contains(&t)
}
