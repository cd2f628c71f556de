use crate::engine::metrics::RunMetrics;
use crate::error::RunError;
use anyhow::Result;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const METRIC_REQUEST_DURATION: &str = "http_req_duration";
pub const METRIC_REQUEST_FAILED: &str = "http_req_failed";

/// Aggregate functions usable in threshold expressions. Duration aggregates
/// observe milliseconds; `rate` observes a fraction in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(self, observed: f64, bound: f64) -> bool {
        match self {
            Comparison::Lt => observed < bound,
            Comparison::Le => observed <= bound,
            Comparison::Gt => observed > bound,
            Comparison::Ge => observed >= bound,
        }
    }
}

/// A declared pass/fail bound on an aggregate run metric, e.g.
/// `http_req_duration: p(95)<500` or `http_req_failed: rate<0.05`.
/// Evaluated once, over the whole run.
#[derive(Debug, Clone)]
pub struct Threshold {
    pub metric: String,
    pub aggregate: Aggregate,
    pub comparison: Comparison,
    pub bound: f64,
    pub expr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    pub metric: String,
    pub expr: String,
    pub observed: f64,
    pub passed: bool,
}

impl Threshold {
    pub fn parse(metric: &str, expr: &str) -> Result<Self, RunError> {
        if metric != METRIC_REQUEST_DURATION && metric != METRIC_REQUEST_FAILED {
            return Err(RunError::UnknownMetric(metric.to_string()));
        }

        let grammar =
            Regex::new(r"^(avg|min|max|med|rate|p\((\d+(?:\.\d+)?)\))\s*(<=|>=|<|>)\s*(\d+(?:\.\d+)?)$")
                .expect("threshold grammar is valid");

        let bad = || RunError::BadThreshold {
            metric: metric.to_string(),
            expr: expr.to_string(),
        };

        let captures = grammar.captures(expr.trim()).ok_or_else(bad)?;

        let aggregate = match &captures[1] {
            "avg" => Aggregate::Avg,
            "min" => Aggregate::Min,
            "max" => Aggregate::Max,
            "med" => Aggregate::Med,
            "rate" => Aggregate::Rate,
            _ => {
                let percentile: f64 = captures[2].parse().map_err(|_| bad())?;
                if !(0.0..=100.0).contains(&percentile) {
                    return Err(bad());
                }
                Aggregate::Percentile(percentile)
            }
        };

        // rate is the only aggregate of the failure metric; durations take
        // the rest.
        let rate_metric = metric == METRIC_REQUEST_FAILED;
        if rate_metric != matches!(aggregate, Aggregate::Rate) {
            return Err(RunError::BadAggregate {
                metric: metric.to_string(),
                aggregate: captures[1].to_string(),
            });
        }

        let comparison = match &captures[3] {
            "<" => Comparison::Lt,
            "<=" => Comparison::Le,
            ">" => Comparison::Gt,
            _ => Comparison::Ge,
        };

        let bound: f64 = captures[4].parse().map_err(|_| bad())?;

        Ok(Self {
            metric: metric.to_string(),
            aggregate,
            comparison,
            bound,
            expr: expr.trim().to_string(),
        })
    }

    fn observed(&self, metrics: &RunMetrics) -> f64 {
        match self.aggregate {
            Aggregate::Avg => metrics.avg_response_time().as_secs_f64() * 1000.0,
            Aggregate::Min => metrics.min_response_time().as_secs_f64() * 1000.0,
            Aggregate::Max => metrics.max_response_time().as_secs_f64() * 1000.0,
            Aggregate::Med => metrics.percentile(50.0).as_secs_f64() * 1000.0,
            Aggregate::Percentile(p) => metrics.percentile(p).as_secs_f64() * 1000.0,
            Aggregate::Rate => metrics.failure_rate(),
        }
    }

    pub fn evaluate(&self, metrics: &RunMetrics) -> ThresholdOutcome {
        let observed = self.observed(metrics);
        ThresholdOutcome {
            metric: self.metric.clone(),
            expr: self.expr.clone(),
            observed,
            passed: self.comparison.holds(observed, self.bound),
        }
    }
}

pub fn parse_all(declared: &IndexMap<String, String>) -> Result<Vec<Threshold>> {
    declared
        .iter()
        .map(|(metric, expr)| Threshold::parse(metric, expr).map_err(Into::into))
        .collect()
}

pub fn evaluate_all(thresholds: &[Threshold], metrics: &RunMetrics) -> Vec<ThresholdOutcome> {
    thresholds
        .iter()
        .map(|threshold| threshold.evaluate(metrics))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_the_default_expressions() {
        let duration = Threshold::parse(METRIC_REQUEST_DURATION, "p(95)<500").unwrap();
        assert_eq!(duration.aggregate, Aggregate::Percentile(95.0));
        assert_eq!(duration.comparison, Comparison::Lt);
        assert_eq!(duration.bound, 500.0);

        let failed = Threshold::parse(METRIC_REQUEST_FAILED, "rate<0.05").unwrap();
        assert_eq!(failed.aggregate, Aggregate::Rate);
        assert_eq!(failed.bound, 0.05);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(Threshold::parse(METRIC_REQUEST_DURATION, "p95 below 500").is_err());
        assert!(Threshold::parse(METRIC_REQUEST_DURATION, "p(95) << 500").is_err());
        assert!(Threshold::parse(METRIC_REQUEST_DURATION, "p(101)<500").is_err());
        assert!(Threshold::parse("http_req_waiting", "p(95)<500").is_err());
    }

    #[test]
    fn rejects_mismatched_aggregates() {
        assert!(Threshold::parse(METRIC_REQUEST_DURATION, "rate<0.05").is_err());
        assert!(Threshold::parse(METRIC_REQUEST_FAILED, "p(95)<500").is_err());
    }

    #[test]
    fn evaluates_against_recorded_metrics() {
        let mut metrics = RunMetrics::new();
        for millis in [100u64, 200, 300, 400] {
            metrics.record_request(Duration::from_millis(millis), 200, 0);
        }
        metrics.record_request(Duration::from_millis(250), 503, 0);

        let latency = Threshold::parse(METRIC_REQUEST_DURATION, "p(95)<500").unwrap();
        let outcome = latency.evaluate(&metrics);
        assert!(outcome.passed);
        assert!((outcome.observed - 400.0).abs() < 1e-6);

        let tight = Threshold::parse(METRIC_REQUEST_DURATION, "avg<200").unwrap();
        assert!(!tight.evaluate(&metrics).passed);

        // 1 failure out of 5 requests
        let failed = Threshold::parse(METRIC_REQUEST_FAILED, "rate<0.05").unwrap();
        let outcome = failed.evaluate(&metrics);
        assert!(!outcome.passed);
        assert!((outcome.observed - 0.2).abs() < 1e-9);

        let loose = Threshold::parse(METRIC_REQUEST_FAILED, "rate<=0.2").unwrap();
        assert!(loose.evaluate(&metrics).passed);
    }
}
