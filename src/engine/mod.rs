pub mod metrics;
pub mod monitor;
pub mod runner;
pub mod schedule;
pub mod thresholds;

pub use metrics::{RunMetrics, RunResults};
pub use runner::ScenarioRunner;
pub use schedule::{Stage, StageSchedule};
pub use thresholds::{Threshold, ThresholdOutcome};
