use std::error::Error;
use std::path::PathBuf;
use studyplan_core::Config;

use super::plan::PlanArgs;

pub async fn run(args: PlanArgs, out: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let now = args.now()?;
    let response = args.execute(&config, now).await?;
    let ics = response.to_ics(&config.labels.calendar_name, now);

    match out {
        Some(path) => {
            std::fs::write(&path, ics)?;
            println!(
                "exported {} blocks to {}",
                response.structured_blocks.len(),
                path.display()
            );
        }
        None => print!("{ics}"),
    }
    Ok(())
}
