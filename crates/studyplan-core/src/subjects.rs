//! Subject inventory discovered in an imported calendar.
//!
//! The inventory decides which subjects study blocks rotate through and
//! which subjects must appear at least once in the final plan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::calendar::BusyEvent;

/// A course or topic, optionally with a course code such as `TSEA12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Subject {
    pub fn new(name: impl Into<String>, code: Option<String>) -> Self {
        Self {
            name: name.into(),
            code: code.filter(|c| !c.trim().is_empty()),
        }
    }

    /// `"{name} – {code}"`, or whichever part exists.
    pub fn display(&self) -> String {
        match (&self.code, self.name.trim().is_empty()) {
            (Some(code), false) => format!("{} – {}", self.name, code),
            (Some(code), true) => code.clone(),
            (None, _) => self.name.clone(),
        }
    }

    /// True if a free-text hint refers to this subject.
    pub fn matches_hint(&self, hint: &str) -> bool {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return false;
        }
        if let Some(code) = &self.code {
            if code.to_lowercase() == hint {
                return true;
            }
        }
        let name = self.name.to_lowercase();
        !name.is_empty() && (name.contains(&hint) || hint.contains(&name))
    }

    fn key(&self) -> String {
        match &self.code {
            Some(code) => code.to_uppercase(),
            None => self.name.to_lowercase(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// A subject together with how often it occurs in the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub subject: Subject,
    pub occurrences: usize,
}

/// Deduplicated subjects, ordered by descending frequency.
///
/// Ties keep first-seen order so the ordering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInventory {
    entries: Vec<SubjectEntry>,
}

impl SubjectInventory {
    /// Collect subjects from classified calendar events.
    ///
    /// Subjects sharing a course code are one subject; the first name seen
    /// for the code is kept unless it was empty.
    pub fn from_events(events: &[BusyEvent]) -> Self {
        Self::from_subjects(events.iter().filter_map(|e| e.subject.clone()))
    }

    pub fn from_subjects<I: IntoIterator<Item = Subject>>(subjects: I) -> Self {
        let mut entries: Vec<SubjectEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for subject in subjects {
            let key = subject.key();
            match index.get(&key) {
                Some(&i) => {
                    let entry = &mut entries[i];
                    entry.occurrences += 1;
                    if entry.subject.name.trim().is_empty() && !subject.name.trim().is_empty() {
                        entry.subject.name = subject.name;
                    }
                }
                None => {
                    index.insert(key, entries.len());
                    entries.push(SubjectEntry {
                        subject,
                        occurrences: 1,
                    });
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts
        entries.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[SubjectEntry] {
        &self.entries
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.entries.iter().map(|e| &e.subject)
    }

    /// Display strings in inventory order.
    pub fn displays(&self) -> Vec<String> {
        self.subjects().map(Subject::display).collect()
    }

    /// Names usable as preference keywords (name and code).
    pub fn keywords(&self) -> Vec<String> {
        let mut out = Vec::new();
        for subject in self.subjects() {
            if !subject.name.trim().is_empty() {
                out.push(subject.name.clone());
            }
            if let Some(code) = &subject.code {
                out.push(code.clone());
            }
        }
        out
    }

    /// Inventory order with hinted subjects moved to the front.
    ///
    /// Hinted subjects keep the order of the hints; the rest keep
    /// frequency order. Hints matching nothing are ignored.
    pub fn prioritized(&self, hints: &[String]) -> Vec<Subject> {
        let mut front: Vec<usize> = Vec::new();
        for hint in hints {
            for (i, entry) in self.entries.iter().enumerate() {
                if !front.contains(&i) && entry.subject.matches_hint(hint) {
                    front.push(i);
                }
            }
        }

        let mut ordered: Vec<Subject> = front
            .iter()
            .map(|&i| self.entries[i].subject.clone())
            .collect();
        ordered.extend(
            self.entries
                .iter()
                .enumerate()
                .filter(|(i, _)| !front.contains(i))
                .map(|(_, e)| e.subject.clone()),
        );
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str, code: Option<&str>) -> Subject {
        Subject::new(name, code.map(String::from))
    }

    #[test]
    fn display_combines_name_and_code() {
        assert_eq!(subject("Digital Design", Some("TSEA12")).display(), "Digital Design – TSEA12");
        assert_eq!(subject("", Some("TSEA12")).display(), "TSEA12");
        assert_eq!(subject("Physics", None).display(), "Physics");
    }

    #[test]
    fn inventory_orders_by_frequency_then_first_seen() {
        let inv = SubjectInventory::from_subjects(vec![
            subject("Physics", None),
            subject("Math", None),
            subject("Math", None),
            subject("Law", None),
        ]);
        assert_eq!(inv.displays(), vec!["Math", "Physics", "Law"]);
        assert_eq!(inv.entries()[0].occurrences, 2);
    }

    #[test]
    fn inventory_merges_by_course_code() {
        let inv = SubjectInventory::from_subjects(vec![
            subject("", Some("TSEA12")),
            subject("Digital Design", Some("TSEA12")),
        ]);
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.displays(), vec!["Digital Design – TSEA12"]);
    }

    #[test]
    fn prioritized_moves_hints_to_front() {
        let inv = SubjectInventory::from_subjects(vec![
            subject("Physics", None),
            subject("Physics", None),
            subject("Mathematics", None),
            subject("Economics", None),
        ]);
        let ordered = inv.prioritized(&["economics".to_string(), "unknown".to_string()]);
        let names: Vec<_> = ordered.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Economics", "Physics", "Mathematics"]);
    }

    #[test]
    fn hint_matches_code_case_insensitively() {
        assert!(subject("Digital Design", Some("TSEA12")).matches_hint("tsea12"));
        assert!(!subject("Digital Design", Some("TSEA12")).matches_hint(""));
    }
}
