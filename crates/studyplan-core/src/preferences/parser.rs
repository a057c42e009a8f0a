use chrono::NaiveTime;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{PreferenceParser, PreferenceProfile};

// Shared tail: "20", "20:00", "8.30", "8 pm", optional Swedish "kl."
const TIME_TAIL: &str = r"\s*(?:kl\.?\s*)?(\d{1,2})(?:[:.](\d{2}))?\s*(am|pm)?\b";

static AFTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:avoid(?:\s+studying)?\s+after|not\s+after|nothing\s+after|no\s+study(?:ing)?\s+after|done\s+by|inte\s+efter|efter|post){TIME_TAIL}"
    ))
    .expect("avoid-after regex must compile")
});

static BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:avoid(?:\s+studying)?\s+before|not\s+before|nothing\s+before|no\s+study(?:ing)?\s+before|inte\s+före|före|innan|pre){TIME_TAIL}"
    ))
    .expect("avoid-before regex must compile")
});

static WEEKENDS_OFF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:weekends?\s+off|no\s+(?:study(?:ing)?\s+)?(?:on\s+)?weekends?|free\s+weekends?|weekdays\s+only|only\s+weekdays|helgledig|ledig\s+(?:på\s+)?helg|endast\s+vardagar|bara\s+vardagar|ingen\s?(?:studie)?tid\s?(?:på\s+)?(?:lör|sön|helg))",
    )
    .expect("weekends-off regex must compile")
});

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:target|goal|mål)\D{0,12}?(\d+(?:[.,]\d+)?)\s*(?:hours?|hrs?|timmar|timme|tim|h)\b")
        .expect("target regex must compile")
});

/// Built-in subject words and the hint each one produces.
const SUBJECT_KEYWORDS: &[(&str, &str)] = &[
    ("matte", "Matte"),
    ("matematik", "Matematik"),
    ("math", "Math"),
    ("fysik", "Fysik"),
    ("physics", "Physics"),
    ("ekonomi", "Ekonomi"),
    ("economics", "Economics"),
    ("programmering", "Programmering"),
    ("programming", "Programming"),
    ("statistik", "Statistik"),
    ("statistics", "Statistics"),
    ("juridik", "Juridik"),
    ("biologi", "Biologi"),
    ("biology", "Biology"),
    ("kemi", "Kemi"),
    ("chemistry", "Chemistry"),
];

/// Regex and keyword preference parser covering English and Swedish
/// phrasings.
#[derive(Debug, Clone, Default)]
pub struct KeywordPreferenceParser {
    /// Subject names and codes from the calendar, matched verbatim.
    known_subjects: Vec<String>,
}

impl KeywordPreferenceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also recognize these calendar subject names as priority hints.
    pub fn with_known_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_subjects = subjects
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| s.trim().chars().count() >= 3)
            .collect();
        self
    }

    fn priority_subjects(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut hits: Vec<(usize, String)> = Vec::new();

        for (keyword, hint) in SUBJECT_KEYWORDS {
            if let Some(pos) = find_word_start(&lower, keyword) {
                hits.push((pos, (*hint).to_string()));
            }
        }
        for name in &self.known_subjects {
            if let Some(pos) = lower.find(&name.trim().to_lowercase()) {
                hits.push((pos, name.trim().to_string()));
            }
        }

        // Earliest mention first; a later keyword inside the same word loses
        hits.sort_by_key(|(pos, _)| *pos);
        let mut out: Vec<String> = Vec::new();
        for (_, hint) in hits {
            if !out.iter().any(|h| h.eq_ignore_ascii_case(&hint)) {
                out.push(hint);
            }
        }
        out
    }
}

impl PreferenceParser for KeywordPreferenceParser {
    fn parse(&self, text: &str) -> PreferenceProfile {
        let profile = PreferenceProfile {
            avoid_before: BEFORE_RE.captures(text).and_then(|c| capture_time(&c)),
            avoid_after: AFTER_RE.captures(text).and_then(|c| capture_time(&c)),
            weekends_off: WEEKENDS_OFF_RE.is_match(text),
            target_minutes_per_day: TARGET_RE.captures(text).and_then(|c| capture_minutes(&c)),
            priority_subjects: self.priority_subjects(text),
        };
        tracing::debug!(?profile, "parsed preferences");
        profile
    }
}

fn capture_time(caps: &Captures<'_>) -> Option<NaiveTime> {
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("pm") if (1..12).contains(&hour) => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn capture_minutes(caps: &Captures<'_>) -> Option<i64> {
    let hours: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let minutes = (hours * 60.0).round() as i64;
    (1..=24 * 60).contains(&minutes).then_some(minutes)
}

/// Position of `word` in `text` where it starts a word.
fn find_word_start(text: &str, word: &str) -> Option<usize> {
    text.match_indices(word).map(|(i, _)| i).find(|&i| {
        text[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PreferenceProfile {
        KeywordPreferenceParser::new().parse(text)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn empty_text_yields_default_profile() {
        assert!(parse("").is_empty());
        assert!(parse("I like coffee").is_empty());
    }

    #[test]
    fn english_avoid_times() {
        let p = parse("Please avoid before 09:00 and avoid after 18.30");
        assert_eq!(p.avoid_before, Some(hm(9, 0)));
        assert_eq!(p.avoid_after, Some(hm(18, 30)));
    }

    #[test]
    fn swedish_avoid_times() {
        let p = parse("Inget plugg efter 20:00, inte före kl. 8");
        assert_eq!(p.avoid_after, Some(hm(20, 0)));
        assert_eq!(p.avoid_before, Some(hm(8, 0)));
    }

    #[test]
    fn twelve_hour_clock() {
        let p = parse("not after 8 pm");
        assert_eq!(p.avoid_after, Some(hm(20, 0)));
    }

    #[test]
    fn out_of_range_time_is_ignored() {
        assert_eq!(parse("avoid after 27:00").avoid_after, None);
    }

    #[test]
    fn weekends_off_phrases() {
        assert!(parse("weekends off please").weekends_off);
        assert!(parse("Helgledigt!").weekends_off);
        assert!(parse("endast vardagar").weekends_off);
        assert!(parse("ingen studietid lördag").weekends_off);
        assert!(!parse("I study on weekends").weekends_off);
    }

    #[test]
    fn target_hours() {
        assert_eq!(parse("target 4 hours per day").target_minutes_per_day, Some(240));
        assert_eq!(parse("mål: 2,5 timmar").target_minutes_per_day, Some(150));
        assert_eq!(parse("goal 3h/day").target_minutes_per_day, Some(180));
        assert_eq!(parse("target 0 h").target_minutes_per_day, None);
    }

    #[test]
    fn priorities_follow_first_mention() {
        let p = parse("Focus on physics first, then matte and statistik");
        assert_eq!(p.priority_subjects, vec!["Physics", "Matte", "Statistik"]);
    }

    #[test]
    fn keyword_inside_word_is_ignored() {
        // "kemi" inside "alkemisk" must not count
        assert!(parse("alkemisk symbolik").priority_subjects.is_empty());
    }

    #[test]
    fn calendar_subjects_become_hints() {
        let parser = KeywordPreferenceParser::new().with_known_subjects(["Makroekonomi", "TSEA12", "IT"]);
        let p = parser.parse("prioritize tsea12 then makroekonomi");
        assert_eq!(p.priority_subjects, vec!["TSEA12", "Makroekonomi"]);
    }
}
