use crate::engine::thresholds::ThresholdOutcome;
use anyhow::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Aggregate accumulator shared by all virtual users for one run.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    start_instant: Instant,
    response_times: Vec<Duration>,
    request_count: u64,
    failed_requests: u64,
    connection_errors: u64,
    status_codes: HashMap<u16, u64>,
    bytes_received: u64,
    checks: IndexMap<String, CheckStats>,
    iterations: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CheckStats {
    pub passes: u64,
    pub fails: u64,
}

impl CheckStats {
    pub fn pass_rate(&self) -> f64 {
        let total = self.passes + self.fails;
        if total == 0 {
            0.0
        } else {
            self.passes as f64 / total as f64
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            start_instant: Instant::now(),
            response_times: Vec::new(),
            request_count: 0,
            failed_requests: 0,
            connection_errors: 0,
            status_codes: HashMap::new(),
            bytes_received: 0,
            checks: IndexMap::new(),
            iterations: 0,
        }
    }

    /// Record a request that produced a response. Statuses outside 200-399
    /// count as failed requests; check outcomes are recorded separately.
    pub fn record_request(&mut self, response_time: Duration, status: u16, bytes_received: u64) {
        self.response_times.push(response_time);
        self.request_count += 1;
        self.bytes_received += bytes_received;
        *self.status_codes.entry(status).or_insert(0) += 1;

        if !(200..400).contains(&status) {
            self.failed_requests += 1;
        }
    }

    /// Record a request that never produced a response.
    pub fn record_connection_error(&mut self) {
        self.connection_errors += 1;
    }

    pub fn record_check(&mut self, name: &str, passed: bool) {
        let stats = self.checks.entry(name.to_string()).or_default();
        if passed {
            stats.passes += 1;
        } else {
            stats.fails += 1;
        }
    }

    pub fn record_iteration(&mut self) {
        self.iterations += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.request_count + self.connection_errors
    }

    pub fn failed_total(&self) -> u64 {
        self.failed_requests + self.connection_errors
    }

    /// Fraction of requests that failed, connection errors included.
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.failed_total() as f64 / total as f64
        }
    }

    /// Nearest-rank percentile over all recorded response times.
    pub fn percentile(&self, percentile: f64) -> Duration {
        if self.response_times.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted = self.response_times.clone();
        sorted.sort();
        let index = (sorted.len() as f64 * percentile / 100.0) as usize;
        sorted
            .get(index.min(sorted.len() - 1))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn avg_response_time(&self) -> Duration {
        if self.response_times.is_empty() {
            return Duration::ZERO;
        }
        let total: u128 = self.response_times.iter().map(|d| d.as_nanos()).sum();
        Duration::from_nanos((total / self.response_times.len() as u128) as u64)
    }

    pub fn min_response_time(&self) -> Duration {
        self.response_times.iter().min().copied().unwrap_or(Duration::ZERO)
    }

    pub fn max_response_time(&self) -> Duration {
        self.response_times.iter().max().copied().unwrap_or(Duration::ZERO)
    }

    pub fn calculate_results(&self) -> RunResults {
        let total_duration = self.start_instant.elapsed();
        let total_requests = self.total_requests();
        let elapsed_secs = total_duration.as_secs_f64();

        RunResults {
            run_id: self.run_id,
            scenario: String::new(),
            started_at: self.started_at,
            total_requests,
            failed_requests: self.failed_total(),
            connection_errors: self.connection_errors,
            failure_rate: self.failure_rate(),
            iterations: self.iterations,
            requests_per_second: if elapsed_secs > 0.0 {
                total_requests as f64 / elapsed_secs
            } else {
                0.0
            },
            average_response_time: self.avg_response_time(),
            min_response_time: self.min_response_time(),
            max_response_time: self.max_response_time(),
            p50_response_time: self.percentile(50.0),
            p95_response_time: self.percentile(95.0),
            p99_response_time: self.percentile(99.0),
            status_code_distribution: self.status_codes.clone(),
            bytes_received: self.bytes_received,
            bytes_per_second_received: if elapsed_secs > 0.0 {
                self.bytes_received as f64 / elapsed_secs
            } else {
                0.0
            },
            checks: self.checks.clone(),
            thresholds: Vec::new(),
            total_duration,
        }
    }
}

/// Serializable end-of-run summary, written as the JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResults {
    pub run_id: Uuid,
    pub scenario: String,
    pub started_at: DateTime<Utc>,

    pub total_requests: u64,
    pub failed_requests: u64,
    pub connection_errors: u64,
    pub failure_rate: f64,
    pub iterations: u64,
    pub requests_per_second: f64,

    #[serde(with = "duration_serde")]
    pub average_response_time: Duration,
    #[serde(with = "duration_serde")]
    pub min_response_time: Duration,
    #[serde(with = "duration_serde")]
    pub max_response_time: Duration,
    #[serde(with = "duration_serde")]
    pub p50_response_time: Duration,
    #[serde(with = "duration_serde")]
    pub p95_response_time: Duration,
    #[serde(with = "duration_serde")]
    pub p99_response_time: Duration,

    pub status_code_distribution: HashMap<u16, u64>,
    pub bytes_received: u64,
    pub bytes_per_second_received: f64,

    pub checks: IndexMap<String, CheckStats>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdOutcome>,

    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl RunResults {
    pub fn save_report(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

// Helper module for serializing Duration as milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_requests_and_failures() {
        let mut metrics = RunMetrics::new();
        metrics.record_request(Duration::from_millis(100), 200, 1024);
        metrics.record_request(Duration::from_millis(150), 301, 0);
        metrics.record_request(Duration::from_millis(200), 503, 64);
        metrics.record_connection_error();

        assert_eq!(metrics.total_requests(), 4);
        assert_eq!(metrics.failed_total(), 2);
        assert_eq!(metrics.failure_rate(), 0.5);

        let results = metrics.calculate_results();
        assert_eq!(results.total_requests, 4);
        assert_eq!(results.failed_requests, 2);
        assert_eq!(results.connection_errors, 1);
        assert_eq!(results.status_code_distribution.get(&200), Some(&1));
        assert_eq!(results.status_code_distribution.get(&503), Some(&1));
        assert_eq!(results.bytes_received, 1088);
    }

    #[test]
    fn response_time_statistics() {
        let mut metrics = RunMetrics::new();
        for millis in [100u64, 150, 200] {
            metrics.record_request(Duration::from_millis(millis), 200, 0);
        }

        assert_eq!(metrics.min_response_time(), Duration::from_millis(100));
        assert_eq!(metrics.max_response_time(), Duration::from_millis(200));
        assert_eq!(metrics.avg_response_time(), Duration::from_millis(150));
        assert_eq!(metrics.percentile(50.0), Duration::from_millis(150));
        assert_eq!(metrics.percentile(95.0), Duration::from_millis(200));
    }

    #[test]
    fn empty_metrics_produce_zeroed_results() {
        let metrics = RunMetrics::new();
        let results = metrics.calculate_results();
        assert_eq!(results.total_requests, 0);
        assert_eq!(results.failure_rate, 0.0);
        assert_eq!(results.p95_response_time, Duration::ZERO);
    }

    #[test]
    fn checks_keep_insertion_order() {
        let mut metrics = RunMetrics::new();
        metrics.record_check("health OK", true);
        metrics.record_check("recommendations OK", true);
        metrics.record_check("public posts OK", false);
        metrics.record_check("health OK", false);

        let results = metrics.calculate_results();
        let names: Vec<_> = results.checks.keys().cloned().collect();
        assert_eq!(
            names,
            vec!["health OK", "recommendations OK", "public posts OK"]
        );
        let health = &results.checks["health OK"];
        assert_eq!(health.passes, 1);
        assert_eq!(health.fails, 1);
        assert_eq!(health.pass_rate(), 0.5);
    }

    #[test]
    fn report_serializes_durations_as_millis() {
        let mut metrics = RunMetrics::new();
        metrics.record_request(Duration::from_millis(120), 200, 10);
        let mut results = metrics.calculate_results();
        results.scenario = "api-stress".to_string();

        let json = serde_json::to_string(&results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["p95_response_time"], 120);
        assert_eq!(value["scenario"], "api-stress");
    }
}
