//! Study technique catalog.
//!
//! A technique fixes how long work blocks are and how long the breaks
//! between them last. Keys come from user input, so an unknown key falls
//! back to the default Pomodoro 25/5 instead of failing.

use serde::{Deserialize, Serialize};

/// Key of the default technique.
pub const DEFAULT_TECHNIQUE: &str = "pomodoro25";

/// Block sizing policy for one technique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueTemplate {
    pub key: String,
    pub work_minutes: i64,
    pub break_minutes: i64,
    /// Every Nth block of a day is followed by a long break.
    pub long_break_every: Option<u32>,
    pub long_break_minutes: Option<i64>,
    /// Continuous focus cap; reaching it forces a long break.
    pub max_block_minutes: i64,
    pub label: String,
}

impl TechniqueTemplate {
    fn new(
        key: &str,
        work: i64,
        brk: i64,
        long_every: u32,
        long_break: i64,
        max_block: i64,
        label: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            work_minutes: work,
            break_minutes: brk,
            long_break_every: Some(long_every),
            long_break_minutes: Some(long_break),
            max_block_minutes: max_block,
            label: label.to_string(),
        }
    }

    /// Break length after the `block_number`-th block (1-based) of a day.
    ///
    /// `focus_streak` is the work accumulated since the last long break,
    /// including the block just placed.
    pub fn break_after(&self, block_number: u32, focus_streak: i64) -> BreakKind {
        let long = match (self.long_break_every, self.long_break_minutes) {
            (Some(every), Some(minutes)) if every > 0 => {
                if block_number % every == 0 || focus_streak >= self.max_block_minutes {
                    Some(minutes)
                } else {
                    None
                }
            }
            _ => None,
        };
        match long {
            Some(minutes) => BreakKind::Long(minutes),
            None => BreakKind::Short(self.break_minutes),
        }
    }
}

/// The break chosen after a work block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Short(i64),
    Long(i64),
}

impl BreakKind {
    pub fn minutes(&self) -> i64 {
        match self {
            BreakKind::Short(m) | BreakKind::Long(m) => *m,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, BreakKind::Long(_))
    }
}

/// Immutable lookup table of techniques, built once and shared.
#[derive(Debug, Clone)]
pub struct TechniqueCatalog {
    templates: Vec<TechniqueTemplate>,
}

impl TechniqueCatalog {
    pub fn new() -> Self {
        Self {
            templates: vec![
                TechniqueTemplate::new("pomodoro25", 25, 5, 4, 20, 120, "Pomodoro 25/5"),
                TechniqueTemplate::new("pomodoro50", 50, 10, 4, 20, 150, "Pomodoro 50/10"),
                TechniqueTemplate::new("deepwork", 90, 15, 2, 25, 180, "Deep Work 90/15"),
                TechniqueTemplate::new("timeblock", 60, 10, 3, 20, 180, "Time-block 60/10"),
                TechniqueTemplate::new("spaced", 30, 5, 4, 15, 120, "Spaced 30/5"),
                TechniqueTemplate::new("recall", 30, 5, 4, 15, 120, "Active Recall 30/5"),
            ],
        }
    }

    /// Look up a technique; unknown keys resolve to the default.
    pub fn lookup(&self, key: &str) -> &TechniqueTemplate {
        let key = key.trim().to_ascii_lowercase();
        self.templates
            .iter()
            .find(|t| t.key == key)
            .unwrap_or_else(|| self.default_template())
    }

    /// True if `key` names a known technique.
    pub fn contains(&self, key: &str) -> bool {
        let key = key.trim().to_ascii_lowercase();
        self.templates.iter().any(|t| t.key == key)
    }

    pub fn all(&self) -> &[TechniqueTemplate] {
        &self.templates
    }

    fn default_template(&self) -> &TechniqueTemplate {
        // The default entry is always first in the table.
        &self.templates[0]
    }
}

impl Default for TechniqueCatalog {
    fn default() -> Self {
        Self::new()
    }
}
