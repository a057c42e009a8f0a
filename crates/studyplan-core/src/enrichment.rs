//! External plan enrichment.
//!
//! An enrichment service (typically a language model) may propose extra
//! study blocks. The core never talks to such a service itself: callers
//! hand in a [`BlockSuggester`], and its output is treated as untrusted
//! candidates that the conflict resolver normalizes and filters.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::calendar::BusyEvent;
use crate::error::Result;
use crate::schedule::View;
use crate::subjects::SubjectInventory;
use crate::technique::TechniqueTemplate;

/// Subject metadata attached to a suggested block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// An unvalidated block as proposed by an enrichment service.
///
/// Times are kept as text; they are parsed during reconciliation, where
/// unparseable or inverted blocks are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub extended_props: Option<ExtendedProps>,
}

/// Parsed enrichment output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Short human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_text: Option<String>,
    #[serde(default, rename = "structured")]
    pub blocks: Vec<CandidateBlock>,
}

/// Parse the `{plan_text, structured: [...]}` JSON shape.
///
/// Missing fields default to empty. A blank `plan_text` becomes `None`.
pub fn parse_suggestion(json: &str) -> Result<Suggestion> {
    let mut suggestion: Suggestion = serde_json::from_str(json)?;
    suggestion.plan_text = suggestion
        .plan_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    Ok(suggestion)
}

/// What a suggester gets to see about the request.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    pub preferences: &'a str,
    pub technique: &'a TechniqueTemplate,
    pub view: View,
    pub date: Option<NaiveDate>,
    pub events: &'a [BusyEvent],
    pub subjects: &'a SubjectInventory,
}

/// Source of external block suggestions.
pub trait BlockSuggester {
    fn suggest(&self, context: &SuggestionContext<'_>) -> Result<Suggestion>;
}

/// Replays a suggestion obtained earlier, e.g. read from a file.
#[derive(Debug, Clone, Default)]
pub struct StaticSuggester {
    suggestion: Suggestion,
}

impl StaticSuggester {
    pub fn new(suggestion: Suggestion) -> Self {
        Self { suggestion }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(parse_suggestion(json)?))
    }
}

impl BlockSuggester for StaticSuggester {
    fn suggest(&self, _context: &SuggestionContext<'_>) -> Result<Suggestion> {
        Ok(self.suggestion.clone())
    }
}

static EXAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tent|prov|exam").expect("exam regex must compile"));

static EVENING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)kväll|evening|late|\bsen\b|20:00").expect("evening regex must compile")
});

/// Offline improvement tips for a preference text and technique.
///
/// Always returns at least one tip.
pub fn heuristic_tips(preferences: &str, technique_key: &str) -> Vec<String> {
    let mut tips = Vec::new();
    if EXAM_RE.is_match(preferences) {
        tips.push(
            "Plan two 90-minute sessions per subject daily during the last 7 days before the exam."
                .to_string(),
        );
    }
    if EVENING_RE.is_match(preferences) {
        tips.push(
            "Put demanding sessions between 09 and 12, keep afternoons lighter and avoid studying after 20:00."
                .to_string(),
        );
    }
    if technique_key.to_ascii_lowercase().contains("pomodoro") {
        tips.push("Run 4 pomodoros, then take a longer break of 20 to 30 minutes.".to_string());
    }
    if tips.is_empty() {
        tips.push(
            "Add a quick 15-minute review at the end of each day to consolidate what you learned."
                .to_string(),
        );
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_suggestion() {
        let json = r#"{
            "plan_text": "  Focus on TSEA12 early.  ",
            "structured": [
                {"title": "Digital Design", "start": "2025-09-10T08:00:00+02:00",
                 "end": "2025-09-10T09:00:00+02:00", "technique": "Deep Work 90/15",
                 "extendedProps": {"subject": "Digital Design", "code": "TSEA12"}},
                {"title": "No times"}
            ]
        }"#;
        let s = parse_suggestion(json).unwrap();
        assert_eq!(s.plan_text.as_deref(), Some("Focus on TSEA12 early."));
        assert_eq!(s.blocks.len(), 2);
        let props = s.blocks[0].extended_props.as_ref().unwrap();
        assert_eq!(props.code.as_deref(), Some("TSEA12"));
        assert!(s.blocks[1].start.is_none());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let s = parse_suggestion("{}").unwrap();
        assert!(s.plan_text.is_none());
        assert!(s.blocks.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_suggestion("not json").is_err());
    }

    #[test]
    fn tips_by_keyword() {
        let tips = heuristic_tips("Tentamen next week, no studying late", "deepwork");
        assert_eq!(tips.len(), 2);
        assert!(tips[0].contains("exam"));

        let tips = heuristic_tips("", "pomodoro25");
        assert_eq!(tips.len(), 1);
        assert!(tips[0].contains("pomodoros"));
    }

    #[test]
    fn default_tip_when_nothing_matches() {
        let tips = heuristic_tips("I like mornings", "spaced");
        assert_eq!(tips.len(), 1);
        assert!(tips[0].contains("review"));
    }
}
