use crate::config::{ScenarioConfig, ThinkTime};
use crate::engine::metrics::{RunMetrics, RunResults};
use crate::engine::monitor::RunMonitor;
use crate::engine::schedule::StageSchedule;
use crate::engine::thresholds::{self, Threshold};
use crate::scenario::iteration::run_iteration;
use crate::scenario::{acquire_token, Endpoints, SetupData};
use crate::ui::progress::create_spinner;
use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use owo_colors::OwoColorize;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;

/// How often the supervisor re-reads the ramp profile and adjusts the
/// broadcast VU target.
const SUPERVISOR_TICK: Duration = Duration::from_millis(250);

pub struct ScenarioRunner {
    config: ScenarioConfig,
    schedule: StageSchedule,
    thresholds: Vec<Threshold>,
    endpoints: Endpoints,
    client: Client,
    report_interval: Duration,
    ci: bool,
}

impl ScenarioRunner {
    pub fn new(
        config: ScenarioConfig,
        client: Client,
        report_interval: Duration,
        ci: bool,
    ) -> Result<Self> {
        let schedule = config.schedule();
        let thresholds = config.parsed_thresholds()?;
        let endpoints = Endpoints::for_base(&config.base_url)?;

        Ok(Self {
            config,
            schedule,
            thresholds,
            endpoints,
            client,
            report_interval,
            ci,
        })
    }

    /// Execute the scenario: sign in once, ramp virtual users over the stage
    /// profile, drain, and aggregate.
    pub async fn run(&self) -> Result<RunResults> {
        println!(
            "🚀 Starting scenario: {}",
            self.config.name.bright_white()
        );
        println!("   Base URL: {}", self.config.base_url.bright_white());
        println!(
            "   Stages: {} (peak {} VUs, {:?} total)",
            self.config.stages.len().to_string().bright_white(),
            self.schedule.peak_target().to_string().bright_white(),
            self.schedule.total_duration()
        );

        let shared = Arc::new(SetupData {
            token: Some(self.setup().await?),
        });

        let metrics = Arc::new(Mutex::new(RunMetrics::new()));
        let (target_tx, target_rx) = watch::channel(0u32);

        let monitor = RunMonitor::new(self.report_interval, self.schedule.clone());
        monitor
            .start_background_monitoring(Arc::clone(&metrics), target_rx.clone())
            .await;

        println!("\n🔥 Starting load generation...");

        let run_start = Instant::now();
        let total_duration = self.schedule.total_duration();
        let mut workers = FuturesUnordered::new();
        let mut spawned: u32 = 0;

        while run_start.elapsed() < total_duration {
            let desired = self.schedule.target_at(run_start.elapsed());

            // VUs are spawned lazily the first time the target reaches their
            // index; ramp-down just parks them.
            if desired > spawned {
                for vu_id in spawned..desired {
                    workers.push(tokio::spawn(Self::vu_loop(
                        vu_id,
                        self.client.clone(),
                        self.endpoints.clone(),
                        self.config.think_time.clone(),
                        Arc::clone(&shared),
                        Arc::clone(&metrics),
                        target_rx.clone(),
                    )));
                }
                spawned = desired;
            }

            if target_tx.send(desired).is_err() {
                break;
            }
            sleep(SUPERVISOR_TICK).await;
        }

        // Profile complete: retire every VU and let in-flight iterations
        // finish.
        let _ = target_tx.send(0);
        drop(target_tx);
        while let Some(joined) = workers.next().await {
            if let Err(e) = joined {
                println!("{} Virtual user task failed: {}", "⚠".yellow(), e);
            }
        }

        let final_metrics = metrics.lock().await;
        let mut results = final_metrics.calculate_results();
        results.scenario = self.config.name.clone();
        results.thresholds = thresholds::evaluate_all(&self.thresholds, &final_metrics);

        monitor.print_final_summary(&results);

        Ok(results)
    }

    /// Setup phase: authenticate the test credential exactly once. Any
    /// failure here aborts the run before the first iteration.
    async fn setup(&self) -> Result<String> {
        if self.ci {
            println!("🔑 Signing in to acquire the shared token...");
            let token = acquire_token(&self.client, &self.endpoints, &self.config.credentials).await?;
            println!("{} Shared token acquired", "✔".green());
            return Ok(token);
        }

        let spinner = create_spinner("Signing in to acquire the shared token...");
        let result = acquire_token(&self.client, &self.endpoints, &self.config.credentials).await;
        spinner.finish_and_clear();

        let token = result?;
        println!("{} Shared token acquired", "✔".green());
        Ok(token)
    }

    async fn vu_loop(
        vu_id: u32,
        client: Client,
        endpoints: Endpoints,
        think_time: ThinkTime,
        shared: Arc<SetupData>,
        metrics: Arc<Mutex<RunMetrics>>,
        mut target: watch::Receiver<u32>,
    ) {
        loop {
            let desired = *target.borrow_and_update();
            if vu_id < desired {
                run_iteration(&client, &endpoints, &shared, &think_time, &metrics).await;
            } else if target.changed().await.is_err() {
                // Supervisor is gone: the run is over.
                break;
            }
        }
    }
}
