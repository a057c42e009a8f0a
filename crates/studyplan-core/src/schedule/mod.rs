//! Schedule types shared by the engine, the resolver and the formatter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::timeline::Interval;

/// Where a schedule block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSource {
    /// Placed by the scheduling engine
    Generated,
    /// Pinned by the user; never displaced
    Locked,
    /// Suggested by the external enrichment step
    Ai,
    /// Inserted only to keep a subject visible
    Placeholder,
}

impl BlockSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockSource::Generated => "generated",
            BlockSource::Locked => "locked",
            BlockSource::Ai => "ai",
            BlockSource::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for BlockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The atomic output unit of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub title: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Technique label the block was sized with.
    pub technique: String,
    pub source: BlockSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ScheduleBlock {
    pub fn is_locked(&self) -> bool {
        self.source == BlockSource::Locked
    }

    /// Get total duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl Interval for ScheduleBlock {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A block the user pinned in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBlock {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LockedBlock {
    /// Create a locked block, or `None` if `end` is not after `start`.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self {
                title: title.into(),
                start,
                end,
            })
        } else {
            None
        }
    }

    /// Parse the wire form (ISO-8601 instants with offset).
    ///
    /// An empty title becomes "Locked".
    pub fn parse(title: Option<&str>, start: &str, end: &str) -> Result<Self, ValidationError> {
        let instant = |field: &str, value: &str| {
            DateTime::parse_from_rfc3339(value.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("'{value}': {e}"),
                })
        };
        let start_at = instant("start", start)?;
        let end_at = instant("end", end)?;
        let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("Locked");
        Self::new(title, start_at, end_at).ok_or_else(|| ValidationError::InvalidTimeRange {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        })
    }

    /// The locked block as an output block.
    pub fn to_block(&self, technique: &str) -> ScheduleBlock {
        ScheduleBlock {
            title: self.title.clone(),
            subject: self.title.clone(),
            start: self.start,
            end: self.end,
            technique: technique.to_string(),
            source: BlockSource::Locked,
            notes: Some("Locked by the user".to_string()),
        }
    }
}

impl Interval for LockedBlock {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Daily,
    #[default]
    Weekly,
}

impl View {
    /// Lenient parse: anything other than "daily" is weekly.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(View::Daily),
            "weekly" | "week" => Ok(View::Weekly),
            other => Err(format!("unknown view: {other}")),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Daily => f.write_str("daily"),
            View::Weekly => f.write_str("weekly"),
        }
    }
}
