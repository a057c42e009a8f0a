use chrono::{DateTime, Utc};
use clap::Args;
use std::error::Error;
use std::path::PathBuf;
use studyplan_core::planner::CalendarSource;
use studyplan_core::{
    BlockSuggester, Config, LockInput, PlanRequest, PlanResponse, StaticSuggester, StudyPlanner,
};

/// Where to read the calendar from. A file wins over a URL.
#[derive(Args, Debug, Clone)]
pub struct CalendarArgs {
    /// Calendar file (.ics)
    #[arg(long, value_name = "PATH")]
    pub ics_file: Option<PathBuf>,
    /// Calendar URL (https:// or webcal://)
    #[arg(long, value_name = "URL")]
    pub ics_url: Option<String>,
}

impl CalendarArgs {
    pub fn source(&self) -> Result<CalendarSource, Box<dyn Error>> {
        if let Some(path) = &self.ics_file {
            return Ok(CalendarSource::Text(std::fs::read_to_string(path)?));
        }
        match &self.ics_url {
            Some(url) => Ok(CalendarSource::Url(url.clone())),
            None => Err("either --ics-file or --ics-url is required".into()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub calendar: CalendarArgs,
    /// Free-text preferences, e.g. "not after 18:00, weekends off"
    #[arg(long)]
    pub prefs: String,
    /// Technique key (see `studyplan techniques`)
    #[arg(long)]
    pub technique: Option<String>,
    /// daily or weekly
    #[arg(long)]
    pub view: Option<String>,
    /// Reference date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// JSON file with locked blocks: [{"title", "start", "end"}]
    #[arg(long, value_name = "PATH")]
    pub locks: Option<PathBuf>,
    /// JSON file with enrichment output: {"plan_text", "structured"}
    #[arg(long, value_name = "PATH")]
    pub suggestions: Option<PathBuf>,
    /// Current time (RFC 3339); the system clock when omitted
    #[arg(long)]
    pub now: Option<String>,
}

impl PlanArgs {
    pub fn request(&self, config: &Config) -> Result<PlanRequest, Box<dyn Error>> {
        let ics_text = self
            .calendar
            .ics_file
            .as_ref()
            .map(std::fs::read_to_string)
            .transpose()?;
        let locks: Vec<LockInput> = match &self.locks {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => Vec::new(),
        };

        Ok(PlanRequest {
            ics_text,
            ics_url: self.calendar.ics_url.clone(),
            preferences: self.prefs.clone(),
            technique: Some(
                self.technique
                    .clone()
                    .unwrap_or_else(|| config.defaults.technique.clone()),
            ),
            view: Some(self.view.clone().unwrap_or_else(|| config.defaults.view.clone())),
            date: self.date.clone(),
            locks,
            use_ai: self.suggestions.is_some(),
        })
    }

    pub fn now(&self) -> Result<DateTime<Utc>, Box<dyn Error>> {
        match &self.now {
            Some(raw) => Ok(DateTime::parse_from_rfc3339(raw.trim())?.with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }

    fn suggester(&self) -> Result<Option<StaticSuggester>, Box<dyn Error>> {
        match &self.suggestions {
            Some(path) => Ok(Some(StaticSuggester::from_json(&std::fs::read_to_string(path)?)?)),
            None => Ok(None),
        }
    }

    /// Plan with the on-disk configuration.
    pub async fn execute(&self, config: &Config, now: DateTime<Utc>) -> Result<PlanResponse, Box<dyn Error>> {
        let planner = StudyPlanner::from_config(config)?;
        let request = self.request(config)?;
        let suggester = self.suggester()?;
        let suggester = suggester.as_ref().map(|s| s as &dyn BlockSuggester);
        Ok(planner.plan(&request, now, suggester).await?)
    }
}

pub async fn run(args: PlanArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let now = args.now()?;
    let response = args.execute(&config, now).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", response.plan_text);
        println!();
        println!(
            "{} blocks, {} calendar events",
            response.structured_blocks.len(),
            response.events_count
        );
    }
    Ok(())
}
