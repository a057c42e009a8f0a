//! Plan rendering: a day-grouped text view and stable structured records.

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::schedule::{BlockSource, ScheduleBlock};

/// One output block with a stable identifier.
///
/// The id is derived from local date, start and end time and source, so
/// rendering the same plan twice yields identical ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredBlock {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub technique: String,
    pub source: BlockSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Rendered plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPlan {
    pub text: String,
    pub structured: Vec<StructuredBlock>,
}

#[derive(Debug, Clone)]
pub struct PlanFormatter {
    tz: Tz,
    empty_day: String,
}

impl PlanFormatter {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            empty_day: "No blocks".to_string(),
        }
    }

    /// Line shown under a day without blocks.
    pub fn with_empty_day_label(mut self, label: impl Into<String>) -> Self {
        self.empty_day = label.into();
        self
    }

    /// Render `blocks`.
    ///
    /// Every day in `days` gets a heading, even when empty; days outside
    /// `days` appear only if a block falls on them. Structured records
    /// contain blocks only.
    pub fn format(&self, blocks: &[ScheduleBlock], days: &[NaiveDate]) -> FormattedPlan {
        let mut sorted: Vec<&ScheduleBlock> = blocks.iter().collect();
        sorted.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let mut by_day: BTreeMap<NaiveDate, Vec<&ScheduleBlock>> =
            days.iter().map(|d| (*d, Vec::new())).collect();
        for block in &sorted {
            by_day.entry(self.local_date(block)).or_default().push(*block);
        }

        let mut text = String::new();
        for (i, (date, day_blocks)) in by_day.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            let _ = writeln!(text, "{}", date.format("%Y-%m-%d"));
            if day_blocks.is_empty() {
                let _ = writeln!(text, "• {}", self.empty_day);
            }
            for block in day_blocks {
                let label = if block.subject.trim().is_empty() {
                    &block.title
                } else {
                    &block.subject
                };
                let _ = writeln!(
                    text,
                    "• {}–{}  {} | {}",
                    self.local(block.start).format("%H:%M"),
                    self.local(block.end).format("%H:%M"),
                    label,
                    block.source
                );
            }
        }

        let structured = sorted.iter().map(|b| self.structured(b)).collect();
        FormattedPlan { text, structured }
    }

    /// Structured record for one block.
    pub fn structured(&self, block: &ScheduleBlock) -> StructuredBlock {
        let start = self.local(block.start);
        let end = self.local(block.end);
        StructuredBlock {
            id: format!(
                "{}-{}-{}-{}",
                start.format("%Y-%m-%d"),
                start.format("%H%M"),
                end.format("%H%M"),
                block.source
            ),
            title: block.title.clone(),
            subject: block.subject.clone(),
            start,
            end,
            technique: block.technique.clone(),
            source: block.source,
            notes: block.notes.clone(),
        }
    }

    fn local(&self, instant: DateTime<chrono::Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.tz).fixed_offset()
    }

    fn local_date(&self, block: &ScheduleBlock) -> NaiveDate {
        block.start.with_timezone(&self.tz).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const TZ: Tz = chrono_tz::Europe::Stockholm;

    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        TZ.with_ymd_and_hms(2025, 9, d, h, m, 0).unwrap().with_timezone(&Utc)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn block(d: u32, h: u32, subject: &str, source: BlockSource) -> ScheduleBlock {
        ScheduleBlock {
            title: format!("{subject} – Pomodoro 25/5"),
            subject: subject.to_string(),
            start: local(d, h, 0),
            end: local(d, h, 25),
            technique: "Pomodoro 25/5".to_string(),
            source,
            notes: None,
        }
    }

    #[test]
    fn text_groups_by_day_with_empty_days() {
        let blocks = vec![
            block(9, 10, "Law", BlockSource::Generated),
            block(8, 8, "Physics", BlockSource::Locked),
        ];
        let plan = PlanFormatter::new(TZ).format(&blocks, &[date(8), date(9), date(10)]);
        assert_eq!(
            plan.text,
            "2025-09-08\n• 08:00–08:25  Physics | locked\n\n\
             2025-09-09\n• 10:00–10:25  Law | generated\n\n\
             2025-09-10\n• No blocks\n"
        );
    }

    #[test]
    fn structured_ids_are_stable() {
        let blocks = vec![block(8, 8, "Physics", BlockSource::Generated)];
        let formatter = PlanFormatter::new(TZ);
        let a = formatter.format(&blocks, &[date(8)]);
        let b = formatter.format(&blocks, &[date(8)]);
        assert_eq!(a, b);
        assert_eq!(a.structured[0].id, "2025-09-08-0800-0825-generated");
        assert_eq!(a.structured[0].start.to_rfc3339(), "2025-09-08T08:00:00+02:00");
    }

    #[test]
    fn blocks_outside_range_still_render() {
        let blocks = vec![block(15, 8, "Law", BlockSource::Placeholder)];
        let plan = PlanFormatter::new(TZ)
            .with_empty_day_label("Inga pass")
            .format(&blocks, &[date(12)]);
        assert!(plan.text.starts_with("2025-09-12\n• Inga pass\n\n2025-09-15\n"));
        assert_eq!(plan.structured.len(), 1);
    }

    #[test]
    fn structured_serializes_camel_case() {
        let formatter = PlanFormatter::new(TZ);
        let record = formatter.structured(&block(8, 8, "Physics", BlockSource::Ai));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "ai");
        assert_eq!(json["start"], "2025-09-08T08:00:00+02:00");
        assert!(json.get("notes").is_none());
    }
}
