use crate::engine::schedule::{Stage, StageSchedule};
use crate::engine::thresholds::{self, Threshold};
use crate::error::RunError;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// A load scenario: who to sign in as, where to point, how to ramp, and what
/// counts as a pass. Immutable for the lifetime of a run.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub credentials: Credentials,
    pub stages: Vec<StageConfig>,
    #[serde(default = "default_thresholds")]
    pub thresholds: IndexMap<String, String>,
    #[serde(default)]
    pub think_time: ThinkTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        // Pre-provisioned test account on the target API.
        Self {
            email: "testuser@example.com".to_string(),
            password: "123456".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageConfig {
    #[serde(with = "crate::utils::duration_str")]
    pub duration: Duration,
    pub target: u32,
}

/// Uniform think-time range in seconds, half-open: [min_secs, max_secs).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ThinkTime {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for ThinkTime {
    fn default() -> Self {
        Self {
            min_secs: 1.0,
            max_secs: 3.0,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_thresholds() -> IndexMap<String, String> {
    let mut thresholds = IndexMap::new();
    thresholds.insert(
        thresholds::METRIC_REQUEST_DURATION.to_string(),
        "p(95)<500".to_string(),
    );
    thresholds.insert(
        thresholds::METRIC_REQUEST_FAILED.to_string(),
        "rate<0.05".to_string(),
    );
    thresholds
}

impl Default for ScenarioConfig {
    /// The built-in stress scenario: ramp to 500 VUs over 20s, hold 20s,
    /// ramp back to zero.
    fn default() -> Self {
        Self {
            name: "api-stress".to_string(),
            description: Some("Shared-token stress profile for the posts API".to_string()),
            base_url: default_base_url(),
            credentials: Credentials::default(),
            stages: vec![
                StageConfig {
                    duration: Duration::from_secs(20),
                    target: 500,
                },
                StageConfig {
                    duration: Duration::from_secs(20),
                    target: 500,
                },
                StageConfig {
                    duration: Duration::from_secs(20),
                    target: 0,
                },
            ],
            thresholds: default_thresholds(),
            think_time: ThinkTime::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid scenario file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;

        if self.stages.is_empty() {
            return Err(RunError::NoStages.into());
        }

        if self.think_time.min_secs < 0.0 || self.think_time.min_secs >= self.think_time.max_secs {
            return Err(RunError::BadThinkTime {
                min: self.think_time.min_secs,
                max: self.think_time.max_secs,
            }
            .into());
        }

        self.parsed_thresholds()?;
        Ok(())
    }

    pub fn parsed_thresholds(&self) -> Result<Vec<Threshold>> {
        thresholds::parse_all(&self.thresholds)
    }

    pub fn schedule(&self) -> StageSchedule {
        StageSchedule::new(
            self.stages
                .iter()
                .map(|stage| Stage {
                    duration: stage.duration,
                    target: stage.target,
                })
                .collect(),
        )
    }
}
