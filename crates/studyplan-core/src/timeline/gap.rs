//! Free-window detection for a single planning day.
//!
//! Subtracts busy spans (imported events and locked blocks alike) from the
//! day boundary, then merges fragments separated by less than a small gap so
//! a one-minute sliver between two meetings does not split a window.

use chrono::Duration;

use super::interval::{merge_adjacent, subtract, Interval, TimeInterval};

/// A contiguous span within one planning day not covered by anything busy.
pub type FreeWindow = TimeInterval;

/// Default gap below which neighbouring fragments are merged.
pub const DEFAULT_MERGE_GAP_SECONDS: i64 = 60;

/// Detector for free windows in a day.
#[derive(Debug, Clone)]
pub struct FreeWindowDetector {
    merge_gap: Duration,
}

impl FreeWindowDetector {
    /// Create a detector with the default 60 second merge gap.
    pub fn new() -> Self {
        Self {
            merge_gap: Duration::seconds(DEFAULT_MERGE_GAP_SECONDS),
        }
    }

    /// Set the merge gap.
    pub fn with_merge_gap(mut self, gap: Duration) -> Self {
        self.merge_gap = gap;
        self
    }

    /// Find free windows inside `day`, sorted by start.
    pub fn find_windows<B: Interval>(&self, day: &TimeInterval, busy: &[B]) -> Vec<FreeWindow> {
        let fragments = subtract(day, busy);
        merge_adjacent(&fragments, self.merge_gap)
    }
}

impl Default for FreeWindowDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to find free windows with default settings.
pub fn detect_free_windows<B: Interval>(day: &TimeInterval, busy: &[B]) -> Vec<FreeWindow> {
    FreeWindowDetector::new().find_windows(day, busy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, h, m, s).unwrap()
    }

    fn span(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeInterval {
        TimeInterval::new(start, end).unwrap()
    }

    #[test]
    fn test_find_windows_between_events() {
        let day = span(at(8, 0, 0), at(20, 0, 0));
        let busy = vec![
            span(at(9, 0, 0), at(10, 0, 0)),
            span(at(11, 0, 0), at(12, 0, 0)),
        ];

        let windows = detect_free_windows(&day, &busy);
        assert_eq!(
            windows,
            vec![
                span(at(8, 0, 0), at(9, 0, 0)),
                span(at(10, 0, 0), at(11, 0, 0)),
                span(at(12, 0, 0), at(20, 0, 0)),
            ]
        );
    }

    #[test]
    fn test_short_sliver_is_merged_away() {
        let day = span(at(8, 0, 0), at(12, 0, 0));
        // 30 second busy sliver
        let busy = vec![span(at(9, 0, 0), at(9, 0, 30))];

        let windows = detect_free_windows(&day, &busy);
        assert_eq!(windows, vec![day]);
    }

    #[test]
    fn test_custom_merge_gap_keeps_sliver() {
        let day = span(at(8, 0, 0), at(12, 0, 0));
        let busy = vec![span(at(9, 0, 0), at(9, 0, 30))];

        let windows = FreeWindowDetector::new()
            .with_merge_gap(Duration::zero())
            .find_windows(&day, &busy);
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_fully_booked_day_has_no_windows() {
        let day = span(at(8, 0, 0), at(20, 0, 0));
        let busy = vec![span(at(7, 0, 0), at(21, 0, 0))];
        assert!(detect_free_windows(&day, &busy).is_empty());
    }
}
