//! Planning pipeline.
//!
//! Turns one [`PlanRequest`] into a [`PlanResponse`]:
//! validate, load the calendar, parse preferences, schedule, merge in
//! locked and suggested blocks, and render.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{build_ics, parse_calendar, BusyEvent, CalendarFetcher, Classifier};
use crate::conflict_resolver::ConflictResolver;
use crate::enrichment::{BlockSuggester, SuggestionContext};
use crate::error::{Result, ValidationError};
use crate::formatter::{PlanFormatter, StructuredBlock};
use crate::preferences::{KeywordPreferenceParser, PreferenceParser};
use crate::schedule::{LockedBlock, View};
use crate::scheduler::{PlanInput, SchedulerConfig, StudyScheduler};
use crate::storage::Config;
use crate::subjects::SubjectInventory;
use crate::technique::{TechniqueCatalog, DEFAULT_TECHNIQUE};

/// A user-pinned block as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInput {
    #[serde(default)]
    pub title: Option<String>,
    pub start: String,
    pub end: String,
}

/// Planning request.
///
/// Calendar text and URL are alternatives; text wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    pub ics_text: Option<String>,
    #[serde(default)]
    pub ics_url: Option<String>,
    #[serde(default)]
    pub preferences: String,
    #[serde(default, alias = "studyTechnique")]
    pub technique: Option<String>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub locks: Vec<LockInput>,
    #[serde(default)]
    pub use_ai: bool,
}

/// Where the calendar comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSource {
    Text(String),
    Url(String),
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub source: CalendarSource,
    pub preferences: String,
    pub technique: String,
    pub view: View,
    pub date: Option<NaiveDate>,
    pub locks: Vec<LockedBlock>,
    pub use_ai: bool,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl PlanRequest {
    /// Check required fields and normalize the optional ones.
    ///
    /// Technique and view fall back to defaults. A malformed date is an
    /// error only for the daily view; locks with bad times are dropped.
    pub fn validate(&self) -> std::result::Result<ValidatedRequest, ValidationError> {
        let preferences = self.preferences.trim();
        if preferences.is_empty() {
            return Err(ValidationError::MissingPreferences);
        }

        let source = if let Some(text) = non_blank(self.ics_text.as_deref()) {
            CalendarSource::Text(text.to_string())
        } else if let Some(url) = non_blank(self.ics_url.as_deref()) {
            CalendarSource::Url(url.to_string())
        } else {
            return Err(ValidationError::MissingCalendarSource);
        };

        let view = non_blank(self.view.as_deref())
            .map(View::parse_lenient)
            .unwrap_or_default();

        let date = match non_blank(self.date.as_deref()) {
            None => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) if view == View::Daily => {
                    return Err(ValidationError::InvalidDate {
                        value: raw.to_string(),
                    });
                }
                Err(_) => {
                    tracing::warn!(date = raw, "ignoring malformed date for weekly view");
                    None
                }
            },
        };

        let locks = self
            .locks
            .iter()
            .filter_map(|lock| {
                LockedBlock::parse(lock.title.as_deref(), &lock.start, &lock.end)
                    .map_err(|err| tracing::warn!(%err, "dropping invalid locked block"))
                    .ok()
            })
            .collect();

        Ok(ValidatedRequest {
            source,
            preferences: preferences.to_string(),
            technique: non_blank(self.technique.as_deref())
                .unwrap_or(DEFAULT_TECHNIQUE)
                .to_string(),
            view,
            date,
            locks,
            use_ai: self.use_ai,
        })
    }
}

/// Planning result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub plan_text: String,
    pub structured_blocks: Vec<StructuredBlock>,
    pub events_count: usize,
}

impl PlanResponse {
    /// The structured blocks as an iCalendar export.
    pub fn to_ics(&self, calendar_name: &str, now: DateTime<Utc>) -> String {
        build_ics(&self.structured_blocks, calendar_name, now)
    }
}

/// Runs planning requests.
///
/// Holds only immutable lookup tables and settings; nothing is cached
/// between requests.
#[derive(Debug, Clone)]
pub struct StudyPlanner {
    scheduler: StudyScheduler,
    catalog: TechniqueCatalog,
    classifier: Classifier,
    formatter: PlanFormatter,
    fetcher: CalendarFetcher,
}

impl StudyPlanner {
    pub fn new(config: SchedulerConfig, fetcher: CalendarFetcher) -> Self {
        let classifier = Classifier::new().with_fallback(config.generic_subject.clone());
        let formatter = PlanFormatter::new(config.timezone);
        Self {
            scheduler: StudyScheduler::with_config(config),
            catalog: TechniqueCatalog::new(),
            classifier,
            formatter,
            fetcher,
        }
    }

    /// Build from the configuration file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = CalendarFetcher::with_user_agent(config.fetch.timeout_secs, &config.fetch.user_agent)?;
        let planner = Self::new(config.scheduler_config()?, fetcher);
        Ok(Self {
            formatter: planner.formatter.with_empty_day_label(config.labels.no_blocks.clone()),
            ..planner
        })
    }

    pub fn scheduler(&self) -> &StudyScheduler {
        &self.scheduler
    }

    pub fn catalog(&self) -> &TechniqueCatalog {
        &self.catalog
    }

    /// Validate, load the calendar and plan.
    pub async fn plan(
        &self,
        request: &PlanRequest,
        now: DateTime<Utc>,
        suggester: Option<&dyn BlockSuggester>,
    ) -> Result<PlanResponse> {
        let validated = request.validate()?;
        let raw = self.load_calendar(&validated.source).await?;
        self.plan_events(&validated, &raw, now, suggester)
    }

    /// Calendar text for `source`, fetching URLs.
    pub async fn load_calendar(&self, source: &CalendarSource) -> Result<String> {
        match source {
            CalendarSource::Text(text) => Ok(text.clone()),
            CalendarSource::Url(url) => Ok(self.fetcher.fetch(url).await?),
        }
    }

    /// Parse and classify calendar text.
    pub fn events(&self, raw: &str) -> Vec<BusyEvent> {
        parse_calendar(raw, &self.scheduler.config().timezone, &self.classifier)
    }

    /// Subject inventory of calendar text.
    pub fn inventory(&self, raw: &str) -> SubjectInventory {
        SubjectInventory::from_events(&self.events(raw))
    }

    /// Plan against already loaded calendar text.
    pub fn plan_events(
        &self,
        request: &ValidatedRequest,
        raw: &str,
        now: DateTime<Utc>,
        suggester: Option<&dyn BlockSuggester>,
    ) -> Result<PlanResponse> {
        let tz = self.scheduler.config().timezone;
        let events = self.events(raw);
        let inventory = SubjectInventory::from_events(&events);
        let preferences = KeywordPreferenceParser::new()
            .with_known_subjects(inventory.keywords())
            .parse(&request.preferences);
        let technique = self.catalog.lookup(&request.technique);
        tracing::debug!(
            events = events.len(),
            subjects = inventory.len(),
            technique = %technique.key,
            view = %request.view,
            "planning request"
        );

        let days = self
            .scheduler
            .planning_days(request.view, request.date, &preferences, now);
        let generated = self.scheduler.plan(&PlanInput {
            events: &events,
            preferences: &preferences,
            technique,
            view: request.view,
            reference_date: request.date,
            locked: &request.locks,
            subjects: &inventory,
            now,
        });

        let suggestion = match (request.use_ai, suggester) {
            (true, Some(suggester)) => Some(suggester.suggest(&SuggestionContext {
                preferences: &request.preferences,
                technique,
                view: request.view,
                date: request.date,
                events: &events,
                subjects: &inventory,
            })?),
            (true, None) => {
                tracing::warn!("enrichment requested but no suggester is configured");
                None
            }
            _ => None,
        };
        let suggestion = suggestion.unwrap_or_default();

        let subjects = inventory.displays();
        let policy = self.scheduler.coverage_policy(
            request.view,
            request.date,
            &preferences,
            now,
            &technique.label,
        );
        let mut resolver = ConflictResolver::new(&self.classifier, tz).with_busy(&events);
        if let Some(policy) = &policy {
            resolver = resolver.with_coverage(policy, &subjects);
        }
        if let Some((start, end)) = self.scheduler.day_bounds(&preferences) {
            resolver = resolver.with_day_bounds(start, end);
        }
        let blocks = resolver.reconcile(generated, &request.locks, &suggestion.blocks, &technique.label);

        let formatted = self.formatter.format(&blocks, &days);
        let plan_text = match suggestion.plan_text {
            Some(summary) => format!("{summary}\n\n{}", formatted.text),
            None => formatted.text,
        };
        tracing::info!(blocks = blocks.len(), days = days.len(), "plan ready");

        Ok(PlanResponse {
            plan_text,
            structured_blocks: formatted.structured,
            events_count: events.len(),
        })
    }
}
