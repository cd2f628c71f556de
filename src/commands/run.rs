use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::config::ScenarioConfig;
use crate::engine::ScenarioRunner;
use crate::http::HttpClient;
use crate::utils::parse_duration;

pub struct RunOptions {
    pub scenario: Option<PathBuf>,
    pub base_url: Option<String>,
    pub output: Option<PathBuf>,
    pub report_interval: String,
    pub timeout: String,
    pub insecure: bool,
    pub ci: bool,
}

pub async fn handle_run(options: RunOptions) -> Result<()> {
    println!("{} Starting load test", "→".cyan());

    let mut config = match &options.scenario {
        Some(path) => {
            println!("Scenario: {}", path.display().to_string().bright_white());
            ScenarioConfig::load(path)?
        }
        None => {
            println!("Scenario: {}", "built-in stress profile".bright_white());
            ScenarioConfig::default()
        }
    };

    if let Some(base_url) = options.base_url {
        config.base_url = base_url;
        config.validate()?;
    }

    let report_interval = parse_duration(&options.report_interval)?;
    let timeout = parse_duration(&options.timeout)?;

    let client = HttpClient::new(timeout, options.insecure)?;
    let runner = ScenarioRunner::new(config, client.into_inner(), report_interval, options.ci)?;

    let results = runner.run().await?;

    println!();
    println!("{} Load test completed", "✔".green().bold());
    println!(
        "Total requests: {}",
        results.total_requests.to_string().bright_white()
    );
    println!(
        "Failure rate: {}%",
        format!("{:.2}", results.failure_rate * 100.0).bright_white()
    );
    println!(
        "P95 response time: {}ms",
        results.p95_response_time.as_millis().to_string().bright_white()
    );

    if let Some(output_path) = options.output {
        println!();
        println!("Saving run report to: {}", output_path.display());
        results.save_report(&output_path)?;
        println!("{} Run report saved", "✔".green());
    }

    // Threshold verdicts decide the exit code.
    let failed: Vec<_> = results
        .thresholds
        .iter()
        .filter(|outcome| !outcome.passed)
        .collect();

    if !failed.is_empty() {
        println!();
        for outcome in &failed {
            println!(
                "{} {} {} (observed {:.2})",
                "✘".red(),
                outcome.metric,
                outcome.expr,
                outcome.observed
            );
        }
        anyhow::bail!(
            "Load test failed: {} of {} thresholds violated",
            failed.len(),
            results.thresholds.len()
        );
    }

    Ok(())
}
