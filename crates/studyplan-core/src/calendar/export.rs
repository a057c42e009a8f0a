//! Plan export as an iCalendar document.

use chrono::{DateTime, Utc};

use super::ics::{escape_text, fold_line, format_utc};
use crate::formatter::StructuredBlock;

const PRODUCT_ID: &str = "-//studyplan//Study Plan//EN";

/// Render blocks as a VCALENDAR with one VEVENT per block.
///
/// Lines end in CRLF and are folded at 75 octets. UIDs derive from the
/// stable block ids, so re-exporting the same plan updates rather than
/// duplicates imported events.
pub fn build_ics(blocks: &[StructuredBlock], calendar_name: &str, now: DateTime<Utc>) -> String {
    let stamp = format_utc(&now);
    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".into(),
        "VERSION:2.0".into(),
        format!("PRODID:{PRODUCT_ID}"),
        "CALSCALE:GREGORIAN".into(),
        "METHOD:PUBLISH".into(),
        format!("X-WR-CALNAME:{}", escape_text(calendar_name)),
    ];

    for block in blocks {
        let start = block.start.with_timezone(&Utc);
        let end = block.end.with_timezone(&Utc);
        lines.push("BEGIN:VEVENT".into());
        lines.push(format!("UID:{}@studyplan", block.id));
        lines.push(format!("DTSTAMP:{stamp}"));
        lines.push(format!("DTSTART:{}", format_utc(&start)));
        lines.push(format!("DTEND:{}", format_utc(&end)));
        lines.push(format!("SUMMARY:{}", escape_text(&block.title)));

        let mut description = format!("{} | {}", block.subject, block.technique);
        if let Some(notes) = &block.notes {
            description.push('\n');
            description.push_str(notes);
        }
        lines.push(format!("DESCRIPTION:{}", escape_text(&description)));
        lines.push(format!("CATEGORIES:{}", block.source.as_str().to_uppercase()));
        lines.push("END:VEVENT".into());
    }
    lines.push("END:VCALENDAR".into());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}
