use std::error::Error;
use studyplan_core::TechniqueCatalog;

pub fn run(json: bool) -> Result<(), Box<dyn Error>> {
    let catalog = TechniqueCatalog::new();
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.all())?);
        return Ok(());
    }
    for t in catalog.all() {
        let long = match (t.long_break_every, t.long_break_minutes) {
            (Some(every), Some(minutes)) => format!(", long break {minutes}m every {every}"),
            _ => String::new(),
        };
        println!(
            "{:<11} {:<20} work {}m, break {}m{}",
            t.key, t.label, t.work_minutes, t.break_minutes, long
        );
    }
    Ok(())
}
