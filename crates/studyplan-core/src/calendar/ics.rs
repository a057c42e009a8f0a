//! Minimal iCalendar (RFC 5545) reader and writer helpers.
//!
//! Only what busy-time extraction needs: line unfolding, property parsing,
//! VEVENT components and date/time values. Nested components such as
//! VALARM are skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::timeline::local_instant;

/// One content line: `NAME;PARAM=VALUE:VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsProperty {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl IcsProperty {
    /// Case-insensitive parameter lookup.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Properties of one VEVENT, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcsEvent {
    pub properties: Vec<IcsProperty>,
}

impl IcsEvent {
    /// First property named `name`.
    pub fn get(&self, name: &str) -> Option<&IcsProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Unescaped text value of `name`, if present and non-blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|p| unescape_text(&p.value))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// A DTSTART/DTEND value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcsTime {
    /// Date-time resolved to an instant.
    Instant(DateTime<Utc>),
    /// `VALUE=DATE`: a whole calendar day.
    Date(NaiveDate),
}

impl IcsTime {
    /// Resolve to an instant; dates become local midnight.
    pub fn to_instant(self, tz: &Tz) -> Option<DateTime<Utc>> {
        match self {
            IcsTime::Instant(dt) => Some(dt),
            IcsTime::Date(date) => local_instant(date, NaiveTime::MIN, tz),
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, IcsTime::Date(_))
    }
}

/// Join folded continuation lines (RFC 5545 §3.1).
pub fn unfold(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !line.trim().is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Parse one unfolded content line.
///
/// Colons and semicolons inside double-quoted parameter values do not split.
pub fn parse_property(line: &str) -> Option<IcsProperty> {
    let mut in_quotes = false;
    let mut colon = None;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next()?.trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }
    let params = parts
        .filter_map(|p| {
            let (k, v) = p.split_once('=')?;
            Some((k.trim().to_ascii_uppercase(), v.trim().trim_matches('"').to_string()))
        })
        .collect();

    Some(IcsProperty {
        name,
        params,
        value: value.to_string(),
    })
}

fn split_unquoted(text: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            out.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    out.push(&text[start..]);
    out
}

/// Collect the top-level VEVENT components of a calendar.
pub fn read_events(raw: &str) -> Vec<IcsEvent> {
    let mut events = Vec::new();
    let mut current: Option<IcsEvent> = None;
    // Depth of components nested inside the current VEVENT
    let mut nested = 0usize;

    for line in unfold(raw) {
        let Some(prop) = parse_property(&line) else {
            continue;
        };
        let name = prop.name.clone();
        let value = prop.value.trim().to_ascii_uppercase();
        match name.as_str() {
            "BEGIN" if current.is_none() => {
                if value == "VEVENT" {
                    current = Some(IcsEvent::default());
                }
            }
            "BEGIN" => nested += 1,
            "END" if current.is_some() && nested > 0 => nested -= 1,
            "END" if value == "VEVENT" => events.extend(current.take()),
            _ if nested == 0 => {
                if let Some(event) = current.as_mut() {
                    event.properties.push(prop);
                }
            }
            _ => {}
        }
    }
    events
}

/// Parse a DTSTART/DTEND property.
///
/// UTC values (`Z` suffix) are absolute; `TZID` values are resolved in that
/// zone, falling back to `default_tz` for unknown zone names; floating
/// values use `default_tz`.
pub fn parse_time(prop: &IcsProperty, default_tz: &Tz) -> Option<IcsTime> {
    let value = prop.value.trim();
    let is_date = prop
        .param("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()));

    if is_date {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(IcsTime::Date);
    }

    if let Some(utc) = value.strip_suffix(['Z', 'z']) {
        let naive = parse_naive(utc)?;
        return Some(IcsTime::Instant(naive.and_utc()));
    }

    let naive = parse_naive(value)?;
    let tz = prop
        .param("TZID")
        .and_then(|name| name.trim_start_matches('/').parse::<Tz>().ok())
        .unwrap_or(*default_tz);
    local_instant(naive.date(), naive.time(), &tz).map(IcsTime::Instant)
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M"))
        .ok()
}

/// Undo TEXT escaping (`\n`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Apply TEXT escaping for writing.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Fold a content line at 75 octets without splitting a UTF-8 character.
pub fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;
    if line.len() <= LIMIT {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / LIMIT * 3);
    let mut used = 0;
    for c in line.chars() {
        // Continuation lines spend one octet on the leading space
        if used + c.len_utf8() > LIMIT {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(c);
        used += c.len_utf8();
    }
    out
}

/// UTC basic format, `20250910T080000Z`.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const STOCKHOLM: Tz = chrono_tz::Europe::Stockholm;

    #[test]
    fn unfold_joins_continuations() {
        let lines = unfold("SUMMARY:Digital\r\n  Design\r\nDTSTART:20250910T080000Z\r\n");
        assert_eq!(lines, vec!["SUMMARY:Digital Design", "DTSTART:20250910T080000Z"]);
    }

    #[test]
    fn parse_property_with_quoted_param() {
        let prop = parse_property("DTSTART;TZID=\"Europe/Stockholm\";X=\"a:b\":20250910T100000").unwrap();
        assert_eq!(prop.name, "DTSTART");
        assert_eq!(prop.param("tzid"), Some("Europe/Stockholm"));
        assert_eq!(prop.param("X"), Some("a:b"));
        assert_eq!(prop.value, "20250910T100000");
    }

    #[test]
    fn read_events_skips_alarms() {
        let raw = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:A\nBEGIN:VALARM\nSUMMARY:Alarm\nEND:VALARM\nEND:VEVENT\nEND:VCALENDAR\n";
        let events = read_events(raw);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text("SUMMARY").as_deref(), Some("A"));
    }

    #[test]
    fn parse_time_forms() {
        let utc = parse_property("DTSTART:20250910T080000Z").unwrap();
        assert_eq!(
            parse_time(&utc, &STOCKHOLM),
            Some(IcsTime::Instant(Utc.with_ymd_and_hms(2025, 9, 10, 8, 0, 0).unwrap()))
        );

        let zoned = parse_property("DTSTART;TZID=America/New_York:20250910T080000").unwrap();
        assert_eq!(
            parse_time(&zoned, &STOCKHOLM),
            Some(IcsTime::Instant(Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()))
        );

        let floating = parse_property("DTSTART:20250910T080000").unwrap();
        assert_eq!(
            parse_time(&floating, &STOCKHOLM),
            Some(IcsTime::Instant(Utc.with_ymd_and_hms(2025, 9, 10, 6, 0, 0).unwrap()))
        );

        let date = parse_property("DTSTART;VALUE=DATE:20250910").unwrap();
        assert_eq!(
            parse_time(&date, &STOCKHOLM),
            Some(IcsTime::Date(NaiveDate::from_ymd_opt(2025, 9, 10).unwrap()))
        );
    }

    #[test]
    fn unknown_tzid_uses_default_zone() {
        let prop = parse_property("DTSTART;TZID=Custom Zone 1:20250910T080000").unwrap();
        assert_eq!(
            parse_time(&prop, &STOCKHOLM),
            Some(IcsTime::Instant(Utc.with_ymd_and_hms(2025, 9, 10, 6, 0, 0).unwrap()))
        );
    }

    #[test]
    fn text_escaping() {
        assert_eq!(unescape_text(r"Room 1\, floor 2\nBring laptop\; charger"), "Room 1, floor 2\nBring laptop; charger");
        assert_eq!(escape_text("a,b;c\\d\ne"), r"a\,b\;c\\d\ne");
    }

    #[test]
    fn fold_line_respects_octet_limit() {
        let line = format!("DESCRIPTION:{}", "å".repeat(60));
        let folded = fold_line(&line);
        for part in folded.split("\r\n") {
            assert!(part.len() <= 75);
        }
        assert_eq!(unfold(&folded).concat(), line);
    }
}
