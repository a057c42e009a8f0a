//! Conflict resolution between generated, suggested and locked blocks.
//!
//! Blocks are processed in chronological order against the set accepted
//! so far. Locked blocks always win; between blocks of equal lock status
//! the one accepted first stays.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::calendar::{BusyEvent, Classifier};
use crate::enrichment::CandidateBlock;
use crate::schedule::{BlockSource, LockedBlock, ScheduleBlock};
use crate::scheduler::CoveragePolicy;
use crate::subjects::Subject;
use crate::timeline::{day_window, overlaps};

const MAX_TITLE_CHARS: usize = 140;

/// Outcome for one incoming block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
    /// Accept and evict the accepted blocks at these positions.
    Displace(Vec<usize>),
}

/// Decide what happens to `incoming` given the blocks accepted so far.
pub fn decide(accepted: &[ScheduleBlock], incoming: &ScheduleBlock) -> Decision {
    let conflicts: Vec<usize> = accepted
        .iter()
        .enumerate()
        .filter(|(_, b)| overlaps(*b, incoming))
        .map(|(i, _)| i)
        .collect();

    if conflicts.is_empty() {
        return Decision::Accept;
    }
    // Locked vs locked and unlocked vs anything: first accepted wins
    if !incoming.is_locked() || conflicts.iter().any(|&i| accepted[i].is_locked()) {
        return Decision::Reject;
    }
    Decision::Displace(conflicts)
}

/// Accept blocks in the given order, resolving overlaps.
///
/// Callers sort by start first; the result never contains overlapping
/// blocks.
pub fn resolve_overlaps(blocks: Vec<ScheduleBlock>) -> Vec<ScheduleBlock> {
    let mut accepted: Vec<ScheduleBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match decide(&accepted, &block) {
            Decision::Accept => accepted.push(block),
            Decision::Reject => {
                tracing::debug!(title = %block.title, source = %block.source, "rejected overlapping block");
            }
            Decision::Displace(indices) => {
                for &i in indices.iter().rev() {
                    let evicted = accepted.remove(i);
                    tracing::debug!(title = %evicted.title, by = %block.title, "locked block displaced block");
                }
                accepted.push(block);
            }
        }
    }
    accepted
}

/// Parse a candidate timestamp: RFC 3339, or a naive local date-time in `tz`.
pub fn parse_instant(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(|naive| crate::timeline::local_instant(naive.date(), naive.time(), tz))
}

/// Reconciles the engine's blocks with locked and suggested blocks.
#[derive(Debug, Clone)]
pub struct ConflictResolver<'a> {
    classifier: &'a Classifier,
    tz: Tz,
    busy: &'a [BusyEvent],
    day_bounds: Option<(NaiveTime, NaiveTime)>,
    coverage: Option<(&'a CoveragePolicy, &'a [String])>,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(classifier: &'a Classifier, tz: Tz) -> Self {
        Self {
            classifier,
            tz,
            busy: &[],
            day_bounds: None,
            coverage: None,
        }
    }

    /// Calendar events suggested blocks must not overlap.
    pub fn with_busy(mut self, busy: &'a [BusyEvent]) -> Self {
        self.busy = busy;
        self
    }

    /// Local day window suggested blocks must fit in.
    pub fn with_day_bounds(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.day_bounds = Some((start, end));
        self
    }

    /// Re-run the coverage guarantee after resolving.
    pub fn with_coverage(mut self, policy: &'a CoveragePolicy, subjects: &'a [String]) -> Self {
        self.coverage = Some((policy, subjects));
        self
    }

    /// Turn suggested blocks into schedule blocks.
    ///
    /// Blocks whose times do not parse or are not ordered are dropped.
    /// Missing subjects are inferred from title and notes.
    pub fn normalize(&self, candidates: &[CandidateBlock], technique_label: &str) -> Vec<ScheduleBlock> {
        candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let start = c.start.as_deref().and_then(|s| parse_instant(s, &self.tz));
                let end = c.end.as_deref().and_then(|s| parse_instant(s, &self.tz));
                let (Some(start), Some(end)) = (start, end) else {
                    tracing::debug!(index = i, "dropping suggested block with invalid times");
                    return None;
                };
                if end <= start {
                    tracing::debug!(index = i, "dropping suggested block with inverted times");
                    return None;
                }

                let title = c
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| t.chars().take(MAX_TITLE_CHARS).collect::<String>())
                    .unwrap_or_else(|| format!("Block {}", i + 1));
                let subject = self.candidate_subject(c, &title);

                Some(ScheduleBlock {
                    title,
                    subject,
                    start,
                    end,
                    technique: c
                        .technique
                        .as_deref()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .unwrap_or(technique_label)
                        .to_string(),
                    source: BlockSource::Ai,
                    notes: c.notes.clone().filter(|n| !n.trim().is_empty()),
                })
            })
            .collect()
    }

    fn candidate_subject(&self, candidate: &CandidateBlock, title: &str) -> String {
        let props = candidate.extended_props.as_ref();
        let named = props
            .and_then(|p| p.subject.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(name) = named {
            let code = props.and_then(|p| p.code.clone());
            return Subject::new(name, code).display();
        }
        let notes: Vec<&str> = candidate.notes.as_deref().into_iter().collect();
        self.classifier.classify(title, &notes).display
    }

    fn fits_day(&self, block: &ScheduleBlock) -> bool {
        let Some((start, end)) = self.day_bounds else {
            return true;
        };
        let date = block.start.with_timezone(&self.tz).date_naive();
        day_window(date, start, end, &self.tz).is_some_and(|day| day.contains(block))
    }

    /// Merge generated, suggested and locked blocks into one
    /// non-overlapping plan, sorted by start.
    ///
    /// Placeholders among `generated` are dropped and recomputed by the
    /// coverage step, if one is configured.
    pub fn reconcile(
        &self,
        generated: Vec<ScheduleBlock>,
        locked: &[LockedBlock],
        suggested: &[CandidateBlock],
        technique_label: &str,
    ) -> Vec<ScheduleBlock> {
        let external: Vec<ScheduleBlock> = self
            .normalize(suggested, technique_label)
            .into_iter()
            .filter(|b| {
                let clashes = self.busy.iter().any(|e| !e.all_day && overlaps(e, b));
                if clashes {
                    tracing::debug!(title = %b.title, "dropping suggested block over a calendar event");
                }
                !clashes
            })
            .filter(|b| {
                let fits = self.fits_day(b);
                if !fits {
                    tracing::debug!(title = %b.title, "dropping suggested block outside day bounds");
                }
                fits
            })
            .collect();

        let mut candidates: Vec<ScheduleBlock> = generated
            .into_iter()
            .filter(|b| b.source != BlockSource::Placeholder)
            .chain(external)
            .chain(locked.iter().map(|l| l.to_block(technique_label)))
            .collect();
        // Stable: on equal spans generated beats suggested
        candidates.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let mut accepted = resolve_overlaps(candidates);
        if let Some((policy, subjects)) = self.coverage {
            policy.apply(&mut accepted, subjects);
        }
        accepted.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
        tracing::debug!(blocks = accepted.len(), "reconciled plan");
        accepted
    }
}
