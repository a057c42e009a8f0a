//! # Studyplan Core Library
//!
//! This library provides the core logic for the Studyplan study planner.
//! It turns a course calendar and a line of free-text preferences into a
//! conflict-free plan of study blocks. The `studyplan` CLI is a thin layer
//! over the same library.
//!
//! ## Architecture
//!
//! - **Calendar**: iCalendar parsing, URL retrieval, subject classification
//!   and export
//! - **Timeline**: Interval arithmetic and free-window detection
//! - **Scheduler**: Greedy, deterministic placement of technique-sized blocks
//! - **Conflict resolution**: Merges generated, suggested and locked blocks
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`StudyPlanner`]: Request pipeline from [`PlanRequest`] to [`PlanResponse`]
//! - [`StudyScheduler`]: The scheduling engine
//! - [`ConflictResolver`]: Reconciliation of block sources
//! - [`Config`]: Application configuration management

pub mod calendar;
pub mod conflict_resolver;
pub mod enrichment;
pub mod error;
pub mod formatter;
pub mod planner;
pub mod preferences;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod subjects;
pub mod technique;
pub mod timeline;

pub use calendar::{parse_calendar, BusyEvent, CalendarFetcher, Classifier, EventKind};
pub use conflict_resolver::ConflictResolver;
pub use enrichment::{heuristic_tips, BlockSuggester, CandidateBlock, StaticSuggester, Suggestion};
pub use error::{ConfigError, CoreError, FetchError, Result, ValidationError};
pub use formatter::{FormattedPlan, PlanFormatter, StructuredBlock};
pub use planner::{CalendarSource, LockInput, PlanRequest, PlanResponse, StudyPlanner};
pub use preferences::{KeywordPreferenceParser, PreferenceParser, PreferenceProfile};
pub use schedule::{BlockSource, LockedBlock, ScheduleBlock, View};
pub use scheduler::{SchedulerConfig, StudyScheduler};
pub use storage::Config;
pub use subjects::{Subject, SubjectInventory};
pub use technique::{TechniqueCatalog, TechniqueTemplate};
pub use timeline::{Interval, TimeInterval};
