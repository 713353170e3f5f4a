//! Experiment configuration loaded from JSON
//!
//! Every section except `sweep` has defaults, so the smallest valid file
//! is just a sweep plan:
//!
//! ```json
//! {
//!   "sweep": {
//!     "motion": "turn",
//!     "axes": [{ "kind": "motor_power_percent", "values": [40, 70, 100] }],
//!     "repeat_num": 3,
//!     "fixed_target": 60
//!   }
//! }
//! ```
//!
//! Durations are milliseconds throughout.

use crate::drive::{DriveBase, SimConfig};
use crate::experiment::{DriveTrialExecutor, SpeedProfile, SweepPlan, TrialProcedure};
use crate::performance::SuiteOptions;
use crate::telemetry::TelemetryConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a sweep run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Speed maxima and default percentages
    #[serde(default)]
    pub speed_profile: SpeedProfile,
    /// Per-trial waits and return-to-start behaviour
    #[serde(default)]
    pub timing: TrialProcedure,
    /// Telemetry logger settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// What to sweep (pacing included)
    pub sweep: SweepPlan,
    /// Simulated drive base parameters (demos and dry runs)
    #[serde(default)]
    pub sim: SimConfig,
    /// Straight-line suite timing
    #[serde(default)]
    pub straight_suite: SuiteOptions,
}

impl ExperimentConfig {
    /// Wrap a plan with default settings everywhere else.
    #[must_use]
    pub fn new(sweep: SweepPlan) -> Self {
        Self {
            speed_profile: SpeedProfile::default(),
            timing: TrialProcedure::default(),
            telemetry: TelemetryConfig::default(),
            sweep,
            sim: SimConfig::default(),
            straight_suite: SuiteOptions::default(),
        }
    }

    /// Parse and validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input or
    /// [`Error::InvalidConfig`] if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`ExperimentConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-section constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.sweep.validate()?;

        if self.telemetry.enabled && self.telemetry.period_ms == 0 {
            return Err(Error::InvalidConfig(
                "telemetry.period_ms must be positive when telemetry is enabled".to_string(),
            ));
        }
        let profile = &self.speed_profile;
        for (name, value) in [
            ("max_straight_speed_mm_s", profile.max_straight_speed_mm_s),
            ("max_turn_rate_deg_s", profile.max_turn_rate_deg_s),
            ("straight_speed_percent", profile.straight_speed_percent),
            ("turn_speed_percent", profile.turn_speed_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "speed_profile.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.sim.tick_ms == 0 {
            return Err(Error::InvalidConfig(
                "sim.tick_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Trial executor for `drive` using this configuration's timing and speeds.
    #[must_use]
    pub fn executor<'a, D: DriveBase>(&self, drive: &'a D) -> DriveTrialExecutor<'a, D> {
        DriveTrialExecutor::new(drive, self.sweep.motion)
            .with_procedure(self.timing)
            .with_speed_profile(self.speed_profile)
    }
}
