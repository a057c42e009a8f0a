//! Best-effort subject and type classification of calendar titles.
//!
//! `"Föreläsning: Digital konstruktion TSEA12 - Sal A"` becomes type
//! `Lecture`, subject `Digital konstruktion`, code `TSEA12`. Nothing here
//! fails: a title that matches no rule is used as-is.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::subjects::Subject;

static COURSE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-zåäö]{2,5}\d{2,4})\b").expect("course code regex must compile")
});

const MAX_SUBJECT_CHARS: usize = 80;

/// Kind of calendar entry, taken from a leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Lecture,
    Seminar,
    Lab,
    Exercise,
    Exam,
    Deadline,
    Meeting,
}

/// Result of classifying one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// `None` when nothing usable was found and the fallback label applies.
    pub subject: Option<Subject>,
    pub kind: Option<EventKind>,
    /// Always non-empty.
    pub display: String,
}

/// Keyword table plus fallback label. Built once, shared by reference.
#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: Vec<(&'static str, EventKind)>,
    fallback: String,
}

impl Classifier {
    pub fn new() -> Self {
        // Longer keywords first so "laboration" wins over "lab"
        let mut keywords = vec![
            ("föreläsning", EventKind::Lecture),
            ("forelasning", EventKind::Lecture),
            ("lecture", EventKind::Lecture),
            ("lektion", EventKind::Lecture),
            ("seminarium", EventKind::Seminar),
            ("seminar", EventKind::Seminar),
            ("laboration", EventKind::Lab),
            ("labb", EventKind::Lab),
            ("lab", EventKind::Lab),
            ("övning", EventKind::Exercise),
            ("exercise", EventKind::Exercise),
            ("tutorial", EventKind::Exercise),
            ("lesson", EventKind::Lecture),
            ("tentamen", EventKind::Exam),
            ("tenta", EventKind::Exam),
            ("exam", EventKind::Exam),
            ("inlämning", EventKind::Deadline),
            ("deadline", EventKind::Deadline),
            ("möte", EventKind::Meeting),
            ("meeting", EventKind::Meeting),
        ];
        keywords.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self {
            keywords,
            fallback: "General".to_string(),
        }
    }

    /// Set the label used when a title is empty.
    pub fn with_fallback(mut self, label: impl Into<String>) -> Self {
        self.fallback = label.into();
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Classify a title; `context` (description, location, notes) is only
    /// searched for a course code when the title has none.
    pub fn classify(&self, title: &str, context: &[&str]) -> Classification {
        let raw = collapse_whitespace(title);
        let (kind, rest) = self.strip_type_keyword(&raw);

        let in_title = COURSE_CODE_RE.captures(rest).and_then(|c| c.get(1));
        let code = in_title
            .map(|m| m.as_str().to_uppercase())
            .or_else(|| find_code(context));

        let name = match in_title {
            Some(m) => {
                let left = first_segment(&rest[..m.start()]);
                if left.is_empty() {
                    first_segment(&rest[m.end()..])
                } else {
                    left
                }
            }
            None => first_segment(rest),
        };
        let name = clip(&name, MAX_SUBJECT_CHARS);

        if !name.is_empty() || code.is_some() {
            let subject = Subject::new(name, code);
            let display = subject.display();
            return Classification {
                subject: Some(subject),
                kind,
                display,
            };
        }

        // Title was only a type keyword, or empty
        if !raw.is_empty() {
            let name = clip(&raw, MAX_SUBJECT_CHARS);
            return Classification {
                subject: Some(Subject::new(name.clone(), None)),
                kind,
                display: name,
            };
        }

        Classification {
            subject: None,
            kind,
            display: self.fallback.clone(),
        }
    }

    /// Split a leading type keyword off `title`.
    fn strip_type_keyword<'a>(&self, title: &'a str) -> (Option<EventKind>, &'a str) {
        let lower = title.to_lowercase();
        for (keyword, kind) in &self.keywords {
            if !lower.starts_with(keyword) {
                continue;
            }
            // Lowercasing can change byte lengths; map back by char count
            let kw_chars = keyword.chars().count();
            let split = title
                .char_indices()
                .nth(kw_chars)
                .map(|(i, _)| i)
                .unwrap_or(title.len());
            let tail = &title[split..];
            if tail.chars().next().is_some_and(char::is_alphanumeric) {
                continue;
            }
            let tail = tail.trim_start_matches(is_separator);
            return (Some(*kind), tail);
        }
        (None, title)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Find a course code in any of the given strings.
pub fn find_code(parts: &[&str]) -> Option<String> {
    parts.iter().find_map(|p| {
        COURSE_CODE_RE
            .captures(p)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_uppercase())
    })
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '|' | '•' | ',' | ';' | '.' | '/')
}

/// Text up to the first line break, bar, bullet, colon or spaced dash.
fn first_segment(text: &str) -> String {
    let mut end = text.len();
    for pat in ["\n", "|", "•", ":", " - ", " – ", " — "] {
        if let Some(i) = text.find(pat) {
            end = end.min(i);
        }
    }
    text[..end].trim_matches(is_separator).to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}
