use std::time::Duration;

/// One step of the ramp profile: over `duration`, move the target VU count
/// linearly from the previous stage's target to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

/// An ordered ramp profile (ramp-up, hold, ramp-down).
#[derive(Debug, Clone)]
pub struct StageSchedule {
    stages: Vec<Stage>,
    total: Duration,
}

impl StageSchedule {
    pub fn new(stages: Vec<Stage>) -> Self {
        let total = stages.iter().map(|stage| stage.duration).sum();
        Self { stages, total }
    }

    pub fn total_duration(&self) -> Duration {
        self.total
    }

    pub fn peak_target(&self) -> u32 {
        self.stages.iter().map(|stage| stage.target).max().unwrap_or(0)
    }

    /// Target VU count at `elapsed`, interpolating linearly within the
    /// active stage. The ramp starts from zero; past the end of the profile
    /// the final target holds.
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        let mut from = 0u32;
        let mut stage_start = Duration::ZERO;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let progress =
                    (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                let interpolated =
                    from as f64 + (stage.target as f64 - from as f64) * progress;
                return interpolated.round() as u32;
            }
            from = stage.target;
            stage_start = stage_end;
        }

        self.stages.last().map(|stage| stage.target).unwrap_or(0)
    }

    /// Human label for the active stage, for progress output.
    pub fn describe(&self, elapsed: Duration) -> String {
        let mut from = 0u32;
        let mut stage_start = Duration::ZERO;

        for (index, stage) in self.stages.iter().enumerate() {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let phase = if stage.target > from {
                    format!("ramping up to {} VUs", stage.target)
                } else if stage.target < from {
                    format!("ramping down to {} VUs", stage.target)
                } else {
                    format!("holding at {} VUs", stage.target)
                };
                return format!("stage {}/{}: {}", index + 1, self.stages.len(), phase);
            }
            from = stage.target;
            stage_start = stage_end;
        }

        "profile complete".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stress_profile() -> StageSchedule {
        StageSchedule::new(vec![
            Stage {
                duration: Duration::from_secs(20),
                target: 500,
            },
            Stage {
                duration: Duration::from_secs(20),
                target: 500,
            },
            Stage {
                duration: Duration::from_secs(20),
                target: 0,
            },
        ])
    }

    #[test]
    fn interpolates_the_stress_profile() {
        let schedule = stress_profile();
        assert_eq!(schedule.total_duration(), Duration::from_secs(60));
        assert_eq!(schedule.peak_target(), 500);

        assert_eq!(schedule.target_at(Duration::ZERO), 0);
        assert_eq!(schedule.target_at(Duration::from_secs(10)), 250);
        assert_eq!(schedule.target_at(Duration::from_secs(20)), 500);
        assert_eq!(schedule.target_at(Duration::from_secs(30)), 500);
        assert_eq!(schedule.target_at(Duration::from_secs(50)), 250);
        assert_eq!(schedule.target_at(Duration::from_secs(60)), 0);
        assert_eq!(schedule.target_at(Duration::from_secs(120)), 0);
    }

    #[test]
    fn holds_final_target_past_the_profile() {
        let schedule = StageSchedule::new(vec![Stage {
            duration: Duration::from_secs(10),
            target: 40,
        }]);
        assert_eq!(schedule.target_at(Duration::from_secs(10)), 40);
        assert_eq!(schedule.target_at(Duration::from_secs(99)), 40);
    }

    #[test]
    fn zero_duration_stage_jumps() {
        let schedule = StageSchedule::new(vec![
            Stage {
                duration: Duration::ZERO,
                target: 100,
            },
            Stage {
                duration: Duration::from_secs(10),
                target: 100,
            },
        ]);
        assert_eq!(schedule.target_at(Duration::from_millis(1)), 100);
    }

    #[test]
    fn describes_phases() {
        let schedule = stress_profile();
        assert_eq!(
            schedule.describe(Duration::from_secs(5)),
            "stage 1/3: ramping up to 500 VUs"
        );
        assert_eq!(
            schedule.describe(Duration::from_secs(25)),
            "stage 2/3: holding at 500 VUs"
        );
        assert_eq!(
            schedule.describe(Duration::from_secs(45)),
            "stage 3/3: ramping down to 0 VUs"
        );
        assert_eq!(schedule.describe(Duration::from_secs(61)), "profile complete");
    }
}
