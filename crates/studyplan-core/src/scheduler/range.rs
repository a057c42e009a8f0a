//! Planning date ranges.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::schedule::View;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// `date` itself if it is a weekday, else the following Monday.
pub fn next_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Days to plan: the reference date for a daily view, Monday to Sunday of
/// its week for a weekly view. Weekends are dropped when `weekends_off`,
/// which leaves a weekend daily view empty.
pub fn planning_days(view: View, reference: NaiveDate, weekends_off: bool) -> Vec<NaiveDate> {
    let candidates: Vec<NaiveDate> = match view {
        View::Daily => vec![reference],
        View::Weekly => {
            let monday = week_start(reference);
            (0..7).map(|i| monday + Duration::days(i)).collect()
        }
    };
    candidates
        .into_iter()
        .filter(|d| !(weekends_off && is_weekend(*d)))
        .collect()
}
