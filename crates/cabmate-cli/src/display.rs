//! Terminal rendering for records, partner results, and cache status.

use cabmate_core::{
    DepartureTime, Partner, TravelRecord, departure::is_flexible, distinct_dates, distinct_places,
};
use cabmate_store::{HealthReport, PartnerResults, RecordsSnapshot, UpdateStatus};
use chrono::{DateTime, Utc};

const NOT_SPECIFIED: &str = "Not specified";

const HEADINGS: [&str; 7] = ["NAME", "DATE", "TIME", "PLACE", "CONTACT", "FLIGHT/TRAIN", "ID"];

// ── Public API ──

pub fn print_records(snapshot: &RecordsSnapshot, records: &[TravelRecord]) {
    print!("{}", records_table(records));
    println!();
    println!(
        "{} shown of {} records, fetched {}",
        records.len(),
        snapshot.count,
        fetched_label(snapshot.fetched_at)
    );
    println!("{}", facet_line("dates", &distinct_dates(&snapshot.records)));
    println!("{}", facet_line("places", &distinct_places(&snapshot.records)));
}

pub fn print_partners(results: &PartnerResults) {
    let window = results.window;
    println!(
        "=== {} partner{} (window -{} / +{} min) ===",
        results.count,
        if results.count == 1 { "" } else { "s" },
        window.before_minutes,
        window.after_minutes
    );
    println!();
    if results.partners.is_empty() {
        println!("No compatible travellers yet. Check back later.");
        return;
    }
    for partner in &results.partners {
        print!("{}", partner_card(partner));
        println!();
    }
}

pub fn print_update(status: &UpdateStatus) {
    println!("{}", update_line(status));
}

pub fn print_health(health: &HealthReport) {
    println!("  {:<14} {}", "records", health.record_count);
    println!("  {:<14} {}", "fetched", fetched_label(health.fetched_at));
    println!(
        "  {:<14} {}",
        "fingerprint",
        health.fingerprint.as_ref().map_or("-", |f| f.as_str())
    );
    println!("  {:<14} {}", "stale", if health.stale { "yes" } else { "no" });
}

// ── Formatting ──

/// Fixed-width table, one record per line.
pub fn records_table(records: &[TravelRecord]) -> String {
    let mut widths = HEADINGS.map(|h| h.chars().count());
    for record in records {
        for (w, cell) in widths.iter_mut().zip(cells(record)) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADINGS, &widths);
    for record in records {
        push_row(&mut out, &cells(record), &widths);
    }
    out
}

fn cells(r: &TravelRecord) -> [&str; 7] {
    [
        r.name.as_str(),
        r.travel_date.as_str(),
        display_time(r),
        r.place.as_str(),
        r.contact.as_str(),
        r.flight_train_number.as_str(),
        r.id.as_str(),
    ]
}

fn push_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

pub fn partner_card(partner: &Partner) -> String {
    let r = &partner.record;
    let mut out = format!("--- {} ---\n", r.name);
    let mut field = |label: &str, value: &str| {
        if !value.is_empty() {
            out.push_str(&format!("  {label:<12} {value}\n"));
        }
    };
    field("date", &r.travel_date);
    field("time", display_time(r));
    field("offset", &offset_label(partner.offset_minutes));
    field("place", &r.place);
    field("contact", &r.contact);
    field("email", &r.email);
    field("flight", &r.flight_train_number);
    out
}

/// How far a partner's departure is from the target's.
pub fn offset_label(offset: Option<i32>) -> String {
    match offset {
        None => "Flexible".to_string(),
        Some(0) => "Same time".to_string(),
        Some(m) if m > 0 => format!("+{m} min"),
        Some(m) => format!("{m} min"),
    }
}

pub fn update_line(status: &UpdateStatus) -> String {
    let fingerprint = status
        .current_fingerprint
        .as_ref()
        .map_or("-", |f| f.as_str());
    if status.has_changed {
        format!(
            "changed: {} records, fingerprint {fingerprint}",
            status.record_count
        )
    } else {
        format!("unchanged: {} records", status.record_count)
    }
}

/// `label: a, b, c` over the whole feed, for picking filter values.
fn facet_line(label: &str, values: &[String]) -> String {
    if values.is_empty() {
        format!("{label}: -")
    } else {
        format!("{label}: {}", values.join(", "))
    }
}

fn display_time(record: &TravelRecord) -> &str {
    if is_flexible(&record.departure_time) {
        NOT_SPECIFIED
    } else {
        &record.departure_time
    }
}

fn fetched_label(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "never".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// One-line description of a target's departure, for headings.
pub fn describe_time(raw: &str) -> String {
    match DepartureTime::classify(raw) {
        DepartureTime::Flexible => "any time".to_string(),
        DepartureTime::At(m) => format!("{:02}:{:02}", m.minutes() / 60, m.minutes() % 60),
        DepartureTime::Invalid => format!("{raw:?} (unreadable)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabmate_core::RecordDraft;

    fn rec(name: &str, time: &str) -> TravelRecord {
        RecordDraft {
            name: name.into(),
            travel_date: "2024-01-15".into(),
            departure_time: time.into(),
            place: "Airport".into(),
            contact: "98765".into(),
            ..Default::default()
        }
        .admit()
        .unwrap()
    }

    #[test]
    fn offset_labels() {
        assert_eq!(offset_label(None), "Flexible");
        assert_eq!(offset_label(Some(0)), "Same time");
        assert_eq!(offset_label(Some(15)), "+15 min");
        assert_eq!(offset_label(Some(-30)), "-30 min");
    }

    #[test]
    fn table_aligns_columns() {
        let table = records_table(&[rec("Asha", "10:30"), rec("Ravindranath", "")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME          DATE"));
        assert!(lines[1].starts_with("Asha          2024-01-15  10:30"));
        assert!(lines[2].contains("Not specified"));
    }

    #[test]
    fn card_skips_empty_fields() {
        let card = partner_card(&Partner {
            record: rec("Asha", "10:30"),
            offset_minutes: Some(-15),
        });
        assert!(card.starts_with("--- Asha ---\n"));
        assert!(card.contains("offset       -15 min"));
        assert!(!card.contains("email"));
        assert!(!card.contains("flight"));
    }

    #[test]
    fn facet_lines_list_feed_values() {
        let mut other = rec("Ravi", "11:00");
        other.place = "Railway Station".into();
        let records = [rec("Asha", "10:30"), other, rec("Meera", "")];

        assert_eq!(
            facet_line("places", &distinct_places(&records)),
            "places: Airport, Railway Station"
        );
        assert_eq!(
            facet_line("dates", &distinct_dates(&records)),
            "dates: 2024-01-15"
        );
        assert_eq!(facet_line("dates", &[]), "dates: -");
    }

    #[test]
    fn describe_times() {
        assert_eq!(describe_time("9:05:00"), "09:05");
        assert_eq!(describe_time("N/A"), "any time");
        assert_eq!(describe_time("soon"), "\"soon\" (unreadable)");
    }
}
