//! Interval arithmetic over absolute time spans.
//!
//! All spans are half-open `[start, end)` in UTC. Touching spans
//! (`a.end == b.start`) do not overlap.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Anything that occupies a span of time.
pub trait Interval {
    fn start(&self) -> DateTime<Utc>;
    fn end(&self) -> DateTime<Utc>;

    /// Length of the span.
    fn duration(&self) -> Duration {
        self.end() - self.start()
    }

    /// The bare span, detached from whatever carries it.
    fn span(&self) -> TimeInterval {
        TimeInterval {
            start: self.start(),
            end: self.end(),
        }
    }
}

/// A non-empty time span. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    /// Create a span, or `None` if it would be empty or inverted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Duration in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// True if `other` lies entirely inside this span.
    pub fn contains<I: Interval + ?Sized>(&self, other: &I) -> bool {
        self.start <= other.start() && other.end() <= self.end
    }
}

impl Interval for TimeInterval {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// True iff `a.start < b.end && b.start < a.end`.
pub fn overlaps<A, B>(a: &A, b: &B) -> bool
where
    A: Interval + ?Sized,
    B: Interval + ?Sized,
{
    a.start() < b.end() && b.start() < a.end()
}

/// Remove every busy span from `window`.
///
/// Each busy span splits the fragments it overlaps into a part before and a
/// part after it; empty parts are discarded. The result is the set
/// difference `window \ ∪busy`, so the order of `busy` does not matter.
pub fn subtract<B: Interval>(window: &TimeInterval, busy: &[B]) -> Vec<TimeInterval> {
    let mut free = vec![*window];

    for b in busy {
        free = free
            .into_iter()
            .flat_map(|w| {
                if !overlaps(&w, b) {
                    return vec![w];
                }
                let mut parts = Vec::with_capacity(2);
                if w.start < b.start() {
                    parts.extend(TimeInterval::new(w.start, b.start()));
                }
                if b.end() < w.end {
                    parts.extend(TimeInterval::new(b.end(), w.end));
                }
                parts
            })
            .collect();
    }

    free
}

/// Merge spans whose gap to the previous span is at most `gap_threshold`.
///
/// Produces a sorted, non-overlapping cover. Idempotent.
pub fn merge_adjacent(windows: &[TimeInterval], gap_threshold: Duration) -> Vec<TimeInterval> {
    let mut sorted = windows.to_vec();
    sorted.sort();

    let mut out: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for cur in sorted {
        match out.last_mut() {
            Some(prev) if cur.start - prev.end <= gap_threshold => {
                prev.end = prev.end.max(cur.end);
            }
            _ => out.push(cur),
        }
    }
    out
}

/// The planning boundary of one calendar day, in the planning zone.
///
/// Returns `None` when either bound does not exist locally (DST gap) or the
/// bounds are inverted.
pub fn day_window(date: NaiveDate, start: NaiveTime, end: NaiveTime, tz: &Tz) -> Option<TimeInterval> {
    let start = local_instant(date, start, tz)?;
    let end = local_instant(date, end, tz)?;
    TimeInterval::new(start, end)
}

/// Resolve a local wall-clock time on `date` to an instant.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
