use std::error::Error;
use studyplan_core::heuristic_tips;
use studyplan_core::technique::DEFAULT_TECHNIQUE;

pub fn run(prefs: &str, technique: Option<&str>) -> Result<(), Box<dyn Error>> {
    for tip in heuristic_tips(prefs, technique.unwrap_or(DEFAULT_TECHNIQUE)) {
        println!("• {tip}");
    }
    Ok(())
}
