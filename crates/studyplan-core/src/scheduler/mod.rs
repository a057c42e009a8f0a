//! Study scheduler.
//!
//! Places technique-sized study blocks into the free time of each planning
//! day:
//! - Selects the planning days (one day or a Monday-to-Sunday week)
//! - Subtracts busy calendar events and locked blocks from each day window
//! - Fills the free windows greedily, with breaks between blocks
//! - Rotates through the calendar's subjects, priority subjects first
//! - Adds placeholders for subjects that got no time
//!
//! Given the same [`PlanInput`] the output is always identical; the only
//! notion of "now" is the explicit `now` field.

mod coverage;
mod range;

pub use coverage::{placeholder_anchor, CoveragePolicy, PLACEHOLDER_NOTE};
pub use range::{is_weekend, next_weekday, planning_days, week_start};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::calendar::BusyEvent;
use crate::preferences::PreferenceProfile;
use crate::schedule::{BlockSource, LockedBlock, ScheduleBlock, View};
use crate::subjects::SubjectInventory;
use crate::technique::TechniqueTemplate;
use crate::timeline::{
    day_window, overlaps, FreeWindow, FreeWindowDetector, Interval, TimeInterval,
    DEFAULT_MERGE_GAP_SECONDS,
};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Zone every local day and time of day is read in
    pub timezone: Tz,
    /// Default day window start
    pub day_start: NaiveTime,
    /// Default day window end
    pub day_end: NaiveTime,
    /// Study minutes per day unless preferences say otherwise
    pub daily_target_minutes: i64,
    /// Shorter remainders of a free window are left empty
    pub min_block_minutes: i64,
    /// Free fragments closer than this are merged
    pub merge_gap: Duration,
    /// Length of a coverage placeholder
    pub placeholder_minutes: i64,
    /// Local hour from which placeholders move to the next day
    pub placeholder_cutoff_hour: u32,
    /// Treat all-day entries as busy time
    pub all_day_events_busy: bool,
    /// Subject used when the calendar yields none
    pub generic_subject: String,
    /// Placeholder title prefix
    pub placeholder_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Stockholm,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            daily_target_minutes: 180,
            min_block_minutes: 15,
            merge_gap: Duration::seconds(DEFAULT_MERGE_GAP_SECONDS),
            placeholder_minutes: 30,
            placeholder_cutoff_hour: 17,
            all_day_events_busy: false,
            generic_subject: "General".to_string(),
            placeholder_prefix: "Unscheduled".to_string(),
        }
    }
}

/// Everything one planning run depends on.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub events: &'a [BusyEvent],
    pub preferences: &'a PreferenceProfile,
    pub technique: &'a TechniqueTemplate,
    pub view: View,
    /// Day the range is built around; today (from `now`) if absent
    pub reference_date: Option<NaiveDate>,
    pub locked: &'a [LockedBlock],
    pub subjects: &'a SubjectInventory,
    pub now: DateTime<Utc>,
}

/// `time` rounded up to the next full hour; `None` past 23:00.
fn ceil_to_hour(time: NaiveTime) -> Option<NaiveTime> {
    if time.minute() == 0 && time.second() == 0 && time.nanosecond() == 0 {
        Some(time)
    } else {
        NaiveTime::from_hms_opt(time.hour() + 1, 0, 0)
    }
}

/// Greedy study scheduler
#[derive(Debug, Clone, Default)]
pub struct StudyScheduler {
    config: SchedulerConfig,
}

impl StudyScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Reference date, defaulting to today in the planning zone.
    pub fn reference_date(&self, reference_date: Option<NaiveDate>, now: DateTime<Utc>) -> NaiveDate {
        reference_date.unwrap_or_else(|| now.with_timezone(&self.config.timezone).date_naive())
    }

    /// Days covered by a plan.
    pub fn planning_days(
        &self,
        view: View,
        reference_date: Option<NaiveDate>,
        preferences: &PreferenceProfile,
        now: DateTime<Utc>,
    ) -> Vec<NaiveDate> {
        planning_days(
            view,
            self.reference_date(reference_date, now),
            preferences.weekends_off,
        )
    }

    /// Local day window after applying avoid-before/avoid-after.
    ///
    /// The start moves to `avoid_before` rounded up to a full hour, or one
    /// hour past the configured start when `avoid_before` equals it. The
    /// end moves to `avoid_after`. Neither ever widens the configured
    /// window. `None` when nothing is left.
    pub fn day_bounds(&self, preferences: &PreferenceProfile) -> Option<(NaiveTime, NaiveTime)> {
        let mut start = self.config.day_start;
        let mut end = self.config.day_end;

        if let Some(before) = preferences.avoid_before {
            let earliest = if before == self.config.day_start {
                NaiveTime::from_hms_opt(before.hour() + 1, 0, 0)?
            } else {
                ceil_to_hour(before)?
            };
            start = start.max(earliest);
        }
        if let Some(after) = preferences.avoid_after {
            end = end.min(after);
        }
        (start < end).then_some((start, end))
    }

    /// Free windows of `date`: the day window minus busy events and
    /// locked blocks, with near-adjacent fragments merged.
    pub fn free_windows(
        &self,
        date: NaiveDate,
        events: &[BusyEvent],
        locked: &[LockedBlock],
        preferences: &PreferenceProfile,
    ) -> Vec<FreeWindow> {
        let Some(day) = self.day_span(date, preferences) else {
            return Vec::new();
        };

        let busy: Vec<TimeInterval> = events
            .iter()
            .filter(|e| self.config.all_day_events_busy || !e.all_day)
            .map(Interval::span)
            .chain(locked.iter().map(Interval::span))
            .filter(|span| overlaps(span, &day))
            .collect();

        FreeWindowDetector::new()
            .with_merge_gap(self.config.merge_gap)
            .find_windows(&day, &busy)
    }

    /// Subject order for round-robin assignment.
    pub fn subject_rotation(
        &self,
        subjects: &SubjectInventory,
        preferences: &PreferenceProfile,
    ) -> Vec<String> {
        if !subjects.is_empty() {
            return subjects
                .prioritized(&preferences.priority_subjects)
                .iter()
                .map(|s| s.display())
                .collect();
        }
        if !preferences.priority_subjects.is_empty() {
            return preferences.priority_subjects.clone();
        }
        vec![self.config.generic_subject.clone()]
    }

    /// Placeholder policy for a plan.
    ///
    /// `None` when the planning range has no days, as for a weekend daily
    /// view with weekends off; such a plan gets no placeholders either.
    pub fn coverage_policy(
        &self,
        view: View,
        reference_date: Option<NaiveDate>,
        preferences: &PreferenceProfile,
        now: DateTime<Utc>,
        technique_label: &str,
    ) -> Option<CoveragePolicy> {
        if self.planning_days(view, reference_date, preferences, now).is_empty() {
            tracing::debug!(%view, "no planning days, skipping coverage");
            return None;
        }
        let anchor = placeholder_anchor(
            view,
            reference_date,
            now,
            &self.config.timezone,
            self.config.placeholder_cutoff_hour,
        );
        let (start, end) = self
            .day_bounds(preferences)
            .unwrap_or((self.config.day_start, self.config.day_end));
        Some(
            CoveragePolicy::new(anchor, start, end, self.config.timezone)
                .with_slot_minutes(self.config.placeholder_minutes)
                .with_prefix(self.config.placeholder_prefix.clone())
                .with_technique(technique_label),
        )
    }

    /// Build the plan: generated blocks plus coverage placeholders,
    /// sorted by start.
    pub fn plan(&self, input: &PlanInput<'_>) -> Vec<ScheduleBlock> {
        let days = self.planning_days(input.view, input.reference_date, input.preferences, input.now);
        let rotation = self.subject_rotation(input.subjects, input.preferences);
        let target = input
            .preferences
            .target_minutes_per_day
            .unwrap_or(self.config.daily_target_minutes);

        let mut blocks = Vec::new();
        let mut next_subject = 0usize;

        for date in &days {
            let placed = self.fill_day(*date, input, target, &rotation, &mut next_subject);
            tracing::debug!(%date, blocks = placed.len(), "filled planning day");
            blocks.extend(placed);
        }

        let subjects = input.subjects.displays();
        if let Some(policy) = self.coverage_policy(
            input.view,
            input.reference_date,
            input.preferences,
            input.now,
            &input.technique.label,
        ) {
            policy.apply(&mut blocks, &subjects);
        }

        blocks.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
        blocks
    }

    fn day_span(&self, date: NaiveDate, preferences: &PreferenceProfile) -> Option<TimeInterval> {
        let (start, end) = self.day_bounds(preferences)?;
        day_window(date, start, end, &self.config.timezone)
    }

    /// Greedy fill of one day.
    fn fill_day(
        &self,
        date: NaiveDate,
        input: &PlanInput<'_>,
        target: i64,
        rotation: &[String],
        next_subject: &mut usize,
    ) -> Vec<ScheduleBlock> {
        let Some(day) = self.day_span(date, input.preferences) else {
            return Vec::new();
        };
        let technique = input.technique;
        let tz = &self.config.timezone;
        let windows = self.free_windows(date, input.events, input.locked, input.preferences);

        let mut out = Vec::new();
        let mut scheduled = 0i64;
        let mut block_number = 0u32;
        let mut focus_streak = 0i64;

        'windows: for window in windows {
            let mut cursor = window.start();

            while cursor < window.end() {
                if scheduled >= target {
                    break 'windows;
                }
                let remaining = (window.end() - cursor).num_minutes();
                let work = technique.work_minutes.min(remaining);
                if work < self.config.min_block_minutes {
                    break;
                }

                let end = cursor + Duration::minutes(work);
                if let Some(after) = input.preferences.avoid_after {
                    if end.with_timezone(tz).time() >= after {
                        break;
                    }
                }

                let subject = rotation
                    .get(*next_subject % rotation.len().max(1))
                    .cloned()
                    .unwrap_or_else(|| self.config.generic_subject.clone());
                let block = ScheduleBlock {
                    title: format!("{} – {}", subject, technique.label),
                    subject,
                    start: cursor,
                    end,
                    technique: technique.label.clone(),
                    source: BlockSource::Generated,
                    notes: None,
                };
                if !day.contains(&block) {
                    tracing::debug!(start = %block.start, end = %block.end, "discarding block outside day bounds");
                    break;
                }
                out.push(block);
                *next_subject += 1;

                scheduled += work;
                block_number += 1;
                focus_streak += work;
                let pause = technique.break_after(block_number, focus_streak);
                if pause.is_long() {
                    focus_streak = 0;
                }
                cursor = end + Duration::minutes(pause.minutes());
            }
        }
        out
    }
}
