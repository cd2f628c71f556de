use crate::engine::metrics::{RunMetrics, RunResults};
use crate::engine::schedule::StageSchedule;
use owo_colors::OwoColorize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

pub struct RunMonitor {
    start_time: Instant,
    report_interval: Duration,
    schedule: StageSchedule,
}

impl RunMonitor {
    pub fn new(report_interval: Duration, schedule: StageSchedule) -> Self {
        Self {
            start_time: Instant::now(),
            report_interval,
            schedule,
        }
    }

    /// Spawn a background task that prints a progress report on every
    /// interval until the profile is over.
    pub async fn start_background_monitoring(
        &self,
        metrics: Arc<Mutex<RunMetrics>>,
        target_vus: watch::Receiver<u32>,
    ) {
        let start_time = self.start_time;
        let report_interval = self.report_interval;
        let schedule = self.schedule.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(report_interval);
            interval.tick().await; // Skip the first tick which fires immediately

            loop {
                interval.tick().await;

                let elapsed = start_time.elapsed();
                if elapsed >= schedule.total_duration() {
                    break;
                }

                let guard = metrics.lock().await;
                print_progress_report(&schedule, elapsed, *target_vus.borrow(), &guard);
            }
        });
    }

    /// Print the final summary when the run completes.
    pub fn print_final_summary(&self, results: &RunResults) {
        println!();
        println!("{}", "=".repeat(60).dimmed());
        println!("{} Scenario Results", "🎯".bright_white());
        println!("{}", "=".repeat(60).dimmed());

        println!();
        println!("{} Run Summary:", "📋".bright_white());
        println!("  Total Duration: {:?}", results.total_duration.bright_white());
        println!("  Iterations: {}", results.iterations.to_string().bright_white());
        println!(
            "  Total Requests: {}",
            results.total_requests.to_string().bright_white()
        );
        println!(
            "  Failed Requests: {}",
            results.failed_requests.to_string().red()
        );
        println!(
            "  Failure Rate: {}%",
            format!("{:.2}", results.failure_rate * 100.0).bright_white()
        );

        println!();
        println!("{} Performance Metrics:", "⚡".bright_white());
        println!(
            "  Requests/sec: {}",
            format!("{:.1}", results.requests_per_second).bright_white()
        );
        println!(
            "  Avg Response: {}ms",
            results.average_response_time.as_millis().to_string().bright_white()
        );
        println!(
            "  Min Response: {}ms",
            results.min_response_time.as_millis().to_string().bright_white()
        );
        println!(
            "  Max Response: {}ms",
            results.max_response_time.as_millis().to_string().bright_white()
        );

        println!();
        println!("{} Response Time Percentiles:", "📊".bright_white());
        println!(
            "  P50 (median): {}ms",
            results.p50_response_time.as_millis().to_string().bright_white()
        );
        println!(
            "  P95: {}ms",
            results.p95_response_time.as_millis().to_string().bright_white()
        );
        println!(
            "  P99: {}ms",
            results.p99_response_time.as_millis().to_string().bright_white()
        );

        if !results.status_code_distribution.is_empty() {
            println!();
            println!("{} Status Code Distribution:", "🔍".bright_white());
            let mut sorted_codes: Vec<_> = results.status_code_distribution.iter().collect();
            sorted_codes.sort_by_key(|(code, _)| *code);

            for (code, count) in sorted_codes {
                let count_str = count.to_string();
                if (200..300).contains(code) {
                    println!("  {}: {}", code, count_str.green());
                } else if *code >= 400 {
                    println!("  {}: {}", code, count_str.red());
                } else {
                    println!("  {}: {}", code, count_str.yellow());
                }
            }
        }

        if !results.checks.is_empty() {
            println!();
            println!("{} Checks:", "✓".bright_white());
            for (name, stats) in &results.checks {
                let marker = if stats.fails == 0 {
                    "✔".green().to_string()
                } else {
                    "⚠".yellow().to_string()
                };
                println!(
                    "  {} {} — {:.1}% ({} passed, {} failed)",
                    marker,
                    name,
                    stats.pass_rate() * 100.0,
                    stats.passes,
                    stats.fails
                );
            }
        }

        if !results.thresholds.is_empty() {
            println!();
            println!("{} Thresholds:", "🚦".bright_white());
            for outcome in &results.thresholds {
                if outcome.passed {
                    println!(
                        "  {} {} {} (observed {:.2})",
                        "✔".green(),
                        outcome.metric,
                        outcome.expr,
                        outcome.observed
                    );
                } else {
                    println!(
                        "  {} {} {} (observed {:.2})",
                        "✘".red(),
                        outcome.metric,
                        outcome.expr,
                        outcome.observed
                    );
                }
            }
        }

        println!("{}", "=".repeat(60).dimmed());
    }
}

fn print_progress_report(
    schedule: &StageSchedule,
    elapsed: Duration,
    target_vus: u32,
    metrics: &RunMetrics,
) {
    let total = schedule.total_duration();
    let progress_percent = if total > Duration::ZERO {
        (elapsed.as_secs_f64() / total.as_secs_f64() * 100.0).min(100.0)
    } else {
        0.0
    };

    let bar_width = 20;
    let filled = ((progress_percent / 100.0) * bar_width as f64) as usize;
    let empty = bar_width - filled;
    let progress_bar = format!(
        "[{}{}]",
        "=".repeat(filled).green(),
        "-".repeat(empty).dimmed()
    );

    let results = metrics.calculate_results();
    let current_rps = if elapsed.as_secs() > 0 {
        results.total_requests as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    println!();
    println!("{} Load Test Progress", "📊".bright_white());
    println!(
        "  {} {:.1}% ({:?} / {:?})",
        progress_bar, progress_percent, elapsed, total
    );
    println!("  Phase: {}", schedule.describe(elapsed).bright_white());
    println!("  Target VUs: {}", target_vus.to_string().bright_white());

    if results.total_requests > 0 {
        println!(
            "  Current RPS: {}",
            format!("{:.1}", current_rps).bright_white()
        );
        println!(
            "  Total Requests: {}",
            results.total_requests.to_string().bright_white()
        );
        println!(
            "  Failure Rate: {}%",
            format!("{:.1}", results.failure_rate * 100.0).bright_white()
        );

        if !results.average_response_time.is_zero() {
            println!(
                "  P95 Response Time: {}ms",
                results.p95_response_time.as_millis().to_string().bright_white()
            );
        }
    }
}
