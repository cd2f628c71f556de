use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::config::ScenarioConfig;
use crate::utils::format_duration;

pub async fn handle_validate(scenario: PathBuf) -> Result<()> {
    let config = ScenarioConfig::load(&scenario)?;
    let schedule = config.schedule();

    println!("{} Scenario is valid", "✔".green().bold());
    println!();
    println!("Name: {}", config.name.bright_white());
    if let Some(description) = &config.description {
        println!("Description: {}", description);
    }
    println!("Base URL: {}", config.base_url.bright_white());
    println!("Test account: {}", config.credentials.email);

    println!();
    println!("Stages ({:?} total):", schedule.total_duration());
    for (index, stage) in config.stages.iter().enumerate() {
        println!(
            "  {}. {} to {} VUs",
            index + 1,
            format_duration(stage.duration),
            stage.target.to_string().bright_white()
        );
    }

    println!();
    println!("Thresholds:");
    for (metric, expr) in &config.thresholds {
        println!("  {}: {}", metric, expr.bright_white());
    }

    println!();
    println!(
        "Think time: [{}s, {}s) per iteration",
        config.think_time.min_secs, config.think_time.max_secs
    );

    Ok(())
}
