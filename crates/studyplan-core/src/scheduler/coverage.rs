//! Coverage guarantee: every tracked subject shows up in the plan.
//!
//! Subjects that received no block get a short placeholder. Placeholders
//! are stacked in consecutive slots from the anchor day's start, skipping
//! anything already planned, and roll over to the next weekday when a
//! day runs out.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use super::range::next_weekday;
use crate::schedule::{BlockSource, ScheduleBlock, View};
use crate::timeline::{local_instant, overlaps, Interval, TimeInterval};

pub const PLACEHOLDER_NOTE: &str = "No free slot in the current plan; move it to a suitable time.";

// Upper bound on days searched for a free placeholder slot
const MAX_SEARCH_DAYS: usize = 60;

/// Day placeholders start on.
///
/// A daily view with an explicit date uses that date. Otherwise the base
/// is the reference date, or today (tomorrow once the local clock reaches
/// `cutoff_hour`), rolled forward past a weekend.
pub fn placeholder_anchor(
    view: View,
    reference_date: Option<NaiveDate>,
    now: DateTime<Utc>,
    tz: &Tz,
    cutoff_hour: u32,
) -> NaiveDate {
    if let (View::Daily, Some(date)) = (view, reference_date) {
        return date;
    }
    let base = reference_date.unwrap_or_else(|| {
        let local = now.with_timezone(tz);
        if local.hour() >= cutoff_hour {
            local.date_naive() + Duration::days(1)
        } else {
            local.date_naive()
        }
    });
    next_weekday(base)
}

/// Placeholder placement for one planning request.
#[derive(Debug, Clone)]
pub struct CoveragePolicy {
    anchor: NaiveDate,
    day_start: NaiveTime,
    day_end: NaiveTime,
    tz: Tz,
    slot: Duration,
    prefix: String,
    technique: String,
}

impl CoveragePolicy {
    pub fn new(anchor: NaiveDate, day_start: NaiveTime, day_end: NaiveTime, tz: Tz) -> Self {
        Self {
            anchor,
            day_start,
            day_end,
            tz,
            slot: Duration::minutes(30),
            prefix: "Unscheduled".to_string(),
            technique: String::new(),
        }
    }

    pub fn with_slot_minutes(mut self, minutes: i64) -> Self {
        self.slot = Duration::minutes(minutes.max(1));
        self
    }

    /// Title prefix, `"{prefix}: {subject}"`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_technique(mut self, label: impl Into<String>) -> Self {
        self.technique = label.into();
        self
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Subjects with no block, in `subjects` order.
    pub fn missing_subjects<'a>(
        &self,
        blocks: &[ScheduleBlock],
        subjects: &'a [String],
    ) -> Vec<&'a String> {
        let present: HashSet<&str> = blocks.iter().map(|b| b.subject.as_str()).collect();
        let mut seen = HashSet::new();
        subjects
            .iter()
            .filter(|s| !present.contains(s.as_str()) && seen.insert(s.as_str()))
            .collect()
    }

    /// Append a placeholder for every subject without a block.
    ///
    /// Returns the number of placeholders added.
    pub fn apply(&self, blocks: &mut Vec<ScheduleBlock>, subjects: &[String]) -> usize {
        let missing: Vec<String> = self
            .missing_subjects(blocks, subjects)
            .into_iter()
            .cloned()
            .collect();

        let mut added = 0;
        for subject in missing {
            let Some(slot) = self.next_free_slot(blocks) else {
                tracing::warn!(%subject, "no slot found for placeholder");
                continue;
            };
            blocks.push(ScheduleBlock {
                title: format!("{}: {}", self.prefix, subject),
                subject,
                start: slot.start(),
                end: slot.end(),
                technique: self.technique.clone(),
                source: BlockSource::Placeholder,
                notes: Some(PLACEHOLDER_NOTE.to_string()),
            });
            added += 1;
        }
        if added > 0 {
            tracing::debug!(added, anchor = %self.anchor, "inserted coverage placeholders");
        }
        added
    }

    fn next_free_slot(&self, blocks: &[ScheduleBlock]) -> Option<TimeInterval> {
        let mut date = self.anchor;
        let mut cursor = local_instant(date, self.day_start, &self.tz);

        for _ in 0..MAX_SEARCH_DAYS {
            let day_end = local_instant(date, self.day_end, &self.tz);
            loop {
                let (Some(start), Some(end_of_day)) = (cursor, day_end) else {
                    break;
                };
                let end = start + self.slot;
                if end > end_of_day {
                    break;
                }
                let Some(candidate) = TimeInterval::new(start, end) else {
                    break;
                };
                match blocks
                    .iter()
                    .filter(|b| overlaps(*b, &candidate))
                    .map(|b| b.end)
                    .max()
                {
                    Some(conflict_end) => cursor = Some(conflict_end),
                    None => return Some(candidate),
                }
            }
            date = next_weekday(date + Duration::days(1));
            cursor = local_instant(date, self.day_start, &self.tz);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TZ: Tz = chrono_tz::Europe::Stockholm;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        TZ.with_ymd_and_hms(2025, 9, d, h, m, 0).unwrap().with_timezone(&Utc)
    }

    fn policy(anchor: NaiveDate) -> CoveragePolicy {
        CoveragePolicy::new(anchor, hm(8, 0), hm(20, 0), TZ).with_technique("Pomodoro 25/5")
    }

    fn generated(subject: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduleBlock {
        ScheduleBlock {
            title: subject.to_string(),
            subject: subject.to_string(),
            start,
            end,
            technique: "Pomodoro 25/5".to_string(),
            source: BlockSource::Generated,
            notes: None,
        }
    }

    #[test]
    fn anchor_daily_date_wins() {
        let now = local(10, 9, 0);
        assert_eq!(placeholder_anchor(View::Daily, Some(date(13)), now, &TZ, 17), date(13));
    }

    #[test]
    fn anchor_rolls_after_cutoff_and_weekend() {
        // Friday 18:00 local: tomorrow is Saturday, so Monday
        let now = local(12, 18, 0);
        assert_eq!(placeholder_anchor(View::Weekly, None, now, &TZ, 17), date(15));
        // Friday morning stays on Friday
        let now = local(12, 9, 0);
        assert_eq!(placeholder_anchor(View::Weekly, None, now, &TZ, 17), date(12));
    }

    #[test]
    fn placeholders_stack_without_overlap() {
        let mut blocks = Vec::new();
        let subjects = vec!["Physics".to_string(), "Law".to_string()];
        let added = policy(date(10)).apply(&mut blocks, &subjects);
        assert_eq!(added, 2);
        assert_eq!(blocks[0].start, local(10, 8, 0));
        assert_eq!(blocks[0].title, "Unscheduled: Physics");
        assert_eq!(blocks[0].notes.as_deref(), Some(PLACEHOLDER_NOTE));
        assert_eq!(blocks[1].start, local(10, 8, 30));
        assert_eq!(blocks[1].source, BlockSource::Placeholder);
    }

    #[test]
    fn placeholders_skip_existing_blocks() {
        let mut blocks = vec![generated("Math", local(10, 8, 0), local(10, 8, 25))];
        let subjects = vec!["Math".to_string(), "Physics".to_string()];
        assert_eq!(policy(date(10)).apply(&mut blocks, &subjects), 1);
        assert_eq!(blocks[1].subject, "Physics");
        assert_eq!(blocks[1].start, local(10, 8, 25));
    }

    #[test]
    fn full_day_rolls_to_next_weekday() {
        // Friday fully covered
        let mut blocks = vec![generated("Math", local(12, 8, 0), local(12, 20, 0))];
        let subjects = vec!["Physics".to_string()];
        policy(date(12)).apply(&mut blocks, &subjects);
        assert_eq!(blocks[1].start, local(15, 8, 0));
    }

    #[test]
    fn present_subjects_need_no_placeholder() {
        let mut blocks = vec![generated("Math", local(10, 8, 0), local(10, 8, 25))];
        assert_eq!(policy(date(10)).apply(&mut blocks, &["Math".to_string()]), 0);
        assert_eq!(blocks.len(), 1);
    }
}
