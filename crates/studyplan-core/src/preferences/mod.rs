//! Structured planning constraints derived from free-form preference text.
//!
//! The engine only ever sees a [`PreferenceProfile`]. How the profile is
//! obtained sits behind the [`PreferenceParser`] trait, so the keyword
//! matcher in [`parser`] can be replaced without touching scheduling.

mod parser;

pub use parser::KeywordPreferenceParser;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Normalized preferences for one planning request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    /// Study only after this time of day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_before: Option<NaiveTime>,
    /// Study only before this time of day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_after: Option<NaiveTime>,
    #[serde(default)]
    pub weekends_off: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_minutes_per_day: Option<i64>,
    /// Subject hints in first-mention order.
    #[serde(default)]
    pub priority_subjects: Vec<String>,
}

impl PreferenceProfile {
    /// True if no constraint was recognized.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Turns raw preference text into a profile. Never fails; unrecognized
/// text yields default fields.
pub trait PreferenceParser {
    fn parse(&self, text: &str) -> PreferenceProfile;
}
