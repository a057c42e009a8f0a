//! Calendar ingest: fetching, parsing, classifying and exporting.

pub mod classify;
pub mod export;
pub mod fetch;
pub mod ics;

pub use classify::{find_code, Classification, Classifier, EventKind};
pub use export::build_ics;
pub use fetch::{find_export_link, looks_like_calendar, CalendarFetcher};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::subjects::Subject;
use crate::timeline::Interval;

/// A busy entry from the imported calendar. `start < end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Date-only entry; spans local midnight to midnight.
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
}

impl BusyEvent {
    pub fn course_code(&self) -> Option<&str> {
        self.subject.as_ref().and_then(|s| s.code.as_deref())
    }
}

impl Interval for BusyEvent {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Parse calendar text into classified busy events, sorted by start.
///
/// Entries without a usable DTSTART/DTEND, or whose end is not after the
/// start, are skipped. Floating times are read in `tz`.
pub fn parse_calendar(raw: &str, tz: &Tz, classifier: &Classifier) -> Vec<BusyEvent> {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for entry in ics::read_events(raw) {
        let start = entry.get("DTSTART").and_then(|p| ics::parse_time(p, tz));
        let end = entry.get("DTEND").and_then(|p| ics::parse_time(p, tz));
        let (Some(start_time), Some(end_time)) = (start, end) else {
            skipped += 1;
            continue;
        };
        let all_day = start_time.is_date();
        let (Some(start), Some(mut end)) = (start_time.to_instant(tz), end_time.to_instant(tz))
        else {
            skipped += 1;
            continue;
        };
        if all_day && end <= start {
            // Some producers repeat DTSTART as DTEND for one-day entries
            end = start + Duration::days(1);
        }
        if end <= start {
            skipped += 1;
            continue;
        }

        let title = entry.text("SUMMARY").unwrap_or_default();
        let location = entry.text("LOCATION");
        let description = entry.text("DESCRIPTION");
        let context: Vec<&str> = [description.as_deref(), location.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        let classification = classifier.classify(&title, &context);

        events.push(BusyEvent {
            uid: entry.text("UID"),
            title: if title.is_empty() {
                classification.display.clone()
            } else {
                title
            },
            start,
            end,
            location,
            description,
            all_day,
            subject: classification.subject,
            kind: classification.kind,
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped calendar entries without a valid time range");
    }
    events.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    tracing::debug!(count = events.len(), "parsed calendar events");
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TZ: Tz = chrono_tz::Europe::Stockholm;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:b@example\r\n\
SUMMARY:Seminarium: Makroekonomi NEKA12\r\n\
DTSTART:20250911T080000Z\r\n\
DTEND:20250911T100000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:a@example\r\n\
SUMMARY:Lecture: Digital Design\r\n\
DESCRIPTION:Course TSEA12\\, hall B\r\n\
DTSTART;TZID=Europe/Stockholm:20250910T100000\r\n\
DTEND;TZID=Europe/Stockholm:20250910T120000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Broken\r\n\
DTSTART:20250910T120000Z\r\n\
DTEND:20250910T110000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:No end\r\n\
DTSTART:20250910T120000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Deadline: Lab report\r\n\
DTSTART;VALUE=DATE:20250912\r\n\
DTEND;VALUE=DATE:20250913\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_sorts_and_skips_invalid() {
        let events = parse_calendar(SAMPLE, &TZ, &Classifier::new());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].uid.as_deref(), Some("a@example"));
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 9, 10, 8, 0, 0).unwrap());
        assert_eq!(events[1].uid.as_deref(), Some("b@example"));
        assert!(events.windows(2).all(|w| w[0].start <= w[1].start));
        assert!(events.iter().all(|e| e.start < e.end));
    }

    #[test]
    fn classifies_subjects_and_codes() {
        let events = parse_calendar(SAMPLE, &TZ, &Classifier::new());
        assert_eq!(events[0].kind, Some(EventKind::Lecture));
        assert_eq!(events[0].course_code(), Some("TSEA12"));
        assert_eq!(events[0].description.as_deref(), Some("Course TSEA12, hall B"));
        assert_eq!(
            events[1].subject.as_ref().map(Subject::display).as_deref(),
            Some("Makroekonomi – NEKA12")
        );
    }

    #[test]
    fn all_day_entries_are_flagged() {
        let events = parse_calendar(SAMPLE, &TZ, &Classifier::new());
        let deadline = &events[2];
        assert!(deadline.all_day);
        assert_eq!(deadline.kind, Some(EventKind::Deadline));
        assert_eq!(deadline.start, Utc.with_ymd_and_hms(2025, 9, 11, 22, 0, 0).unwrap());
        assert_eq!(deadline.duration(), Duration::days(1));
    }

    #[test]
    fn garbage_yields_no_events() {
        assert!(parse_calendar("<html>not a calendar</html>", &TZ, &Classifier::new()).is_empty());
        assert!(parse_calendar("", &TZ, &Classifier::new()).is_empty());
    }
}
