use std::error::Error;
use studyplan_core::{Config, StudyPlanner};

use super::plan::CalendarArgs;

pub async fn run(source: CalendarArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let planner = StudyPlanner::from_config(&config)?;
    let raw = planner.load_calendar(&source.source()?).await?;
    let inventory = planner.inventory(&raw);

    if json {
        println!("{}", serde_json::to_string_pretty(inventory.entries())?);
        return Ok(());
    }
    if inventory.is_empty() {
        println!("no subjects found");
        return Ok(());
    }
    for entry in inventory.entries() {
        println!("{:>3}  {}", entry.occurrences, entry.subject);
    }
    Ok(())
}
