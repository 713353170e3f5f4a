//! Trial execution: one motion, one measurement

use super::{AxisKind, ParameterSetting};
use crate::drive::DriveBase;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Which motion a trial commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    /// Turn in place by the target angle (degrees), measured by heading
    Turn,
    /// Drive straight by the target distance (mm), measured by odometry
    Straight,
}

impl MotionKind {
    /// Axis that carries targets for this motion.
    #[must_use]
    pub const fn target_axis(self) -> AxisKind {
        match self {
            Self::Turn => AxisKind::TargetAngleDeg,
            Self::Straight => AxisKind::TargetDistanceMm,
        }
    }

    /// Unit of targets and errors.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Turn => "deg",
            Self::Straight => "mm",
        }
    }
}

/// Outcome of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// 1-based trial number within its combination
    pub index: usize,
    /// Commanded angle or distance
    pub target: f64,
    /// Measured heading or distance after settling
    pub observed: f64,
    /// `observed - target` (positive = overshoot)
    pub signed_error: f64,
    /// `|observed - target|`
    pub abs_error: f64,
}

impl TrialResult {
    /// Derive the errors for one measurement.
    #[must_use]
    pub fn new(index: usize, target: f64, observed: f64) -> Self {
        let signed_error = observed - target;
        Self {
            index,
            target,
            observed,
            signed_error,
            abs_error: signed_error.abs(),
        }
    }
}

/// Delays and clean-up around each trial. Durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialProcedure {
    /// Pause after the motion completes, before sampling
    pub settle_ms: u64,
    /// Pause after `stop()`
    pub post_stop_ms: u64,
    /// Pause after resetting the sensor reference
    pub post_reset_ms: u64,
    /// Drive back by the target after a straight trial
    pub return_to_start: bool,
    /// Pause after driving back
    pub return_settle_ms: u64,
}

impl Default for TrialProcedure {
    fn default() -> Self {
        Self {
            settle_ms: 1000,
            post_stop_ms: 200,
            post_reset_ms: 500,
            return_to_start: false,
            return_settle_ms: 500,
        }
    }
}

impl TrialProcedure {
    /// No pauses at all (for stubs and tests).
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            settle_ms: 0,
            post_stop_ms: 0,
            post_reset_ms: 0,
            return_to_start: false,
            return_settle_ms: 0,
        }
    }
}

/// Maps percentage settings onto drive-base speeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfile {
    /// Straight speed at 100%, mm/s
    pub max_straight_speed_mm_s: f64,
    /// Turn rate at 100%, deg/s
    pub max_turn_rate_deg_s: f64,
    /// Straight speed used when the setting has no straight-speed axis
    pub straight_speed_percent: f64,
    /// Turn rate used when the setting has no turn-speed axis
    pub turn_speed_percent: f64,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            max_straight_speed_mm_s: 500.0,
            max_turn_rate_deg_s: 500.0,
            straight_speed_percent: 40.0,
            turn_speed_percent: 30.0,
        }
    }
}

impl SpeedProfile {
    /// `(straight mm/s, turn deg/s)` for a setting.
    #[must_use]
    pub fn speeds_for(&self, setting: &ParameterSetting) -> (f64, f64) {
        let straight = setting
            .get(AxisKind::StraightSpeedPercent)
            .unwrap_or(self.straight_speed_percent);
        let turn = setting
            .get(AxisKind::TurnSpeedPercent)
            .unwrap_or(self.turn_speed_percent);
        (
            self.max_straight_speed_mm_s * straight / 100.0,
            self.max_turn_rate_deg_s * turn / 100.0,
        )
    }
}

/// Runs trials for the sweep controller.
///
/// Implementations must surface hardware faults as `Err` rather than
/// recording them as trials.
pub trait TrialExecutor {
    /// Apply a combination's settings before its trials.
    fn configure(&mut self, setting: &ParameterSetting) -> impl Future<Output = Result<()>>;

    /// Run trial `index` (1-based) against `target`.
    fn run_trial(&mut self, index: usize, target: f64) -> impl Future<Output = Result<TrialResult>>;

    /// Fail-safe stop after an aborted sweep.
    fn halt(&mut self) -> impl Future<Output = Result<()>>;
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Trial executor backed by a [`DriveBase`].
///
/// Mutates the sensor reference: heading and distance are reset to zero
/// in [`TrialExecutor::configure`] and after every trial.
#[derive(Debug)]
pub struct DriveTrialExecutor<'a, D> {
    drive: &'a D,
    motion: MotionKind,
    procedure: TrialProcedure,
    speeds: SpeedProfile,
}

impl<'a, D: DriveBase> DriveTrialExecutor<'a, D> {
    /// Create an executor with the default procedure and speed profile.
    #[must_use]
    pub fn new(drive: &'a D, motion: MotionKind) -> Self {
        Self {
            drive,
            motion,
            procedure: TrialProcedure::default(),
            speeds: SpeedProfile::default(),
        }
    }

    /// Use a different trial procedure.
    #[must_use]
    pub const fn with_procedure(mut self, procedure: TrialProcedure) -> Self {
        self.procedure = procedure;
        self
    }

    /// Use a different speed profile.
    #[must_use]
    pub const fn with_speed_profile(mut self, speeds: SpeedProfile) -> Self {
        self.speeds = speeds;
        self
    }

    /// Motion commanded by each trial.
    #[must_use]
    pub const fn motion(&self) -> MotionKind {
        self.motion
    }

    fn reset_reference(&self) -> Result<()> {
        self.drive.reset_heading(0.0)?;
        self.drive.reset_distance()
    }
}

impl<D: DriveBase> TrialExecutor for DriveTrialExecutor<'_, D> {
    async fn configure(&mut self, setting: &ParameterSetting) -> Result<()> {
        let (straight, turn) = self.speeds.speeds_for(setting);
        let power = setting.get(AxisKind::MotorPowerPercent).unwrap_or(100.0);
        debug!(straight, turn, power, "configuring drive base");

        self.drive.set_speeds(straight, turn)?;
        self.drive.set_power_limit(power)?;
        self.reset_reference()
    }

    async fn run_trial(&mut self, index: usize, target: f64) -> Result<TrialResult> {
        match self.motion {
            MotionKind::Turn => self.drive.turn(target).await?,
            MotionKind::Straight => self.drive.straight(target).await?,
        }
        pause(self.procedure.settle_ms).await;

        let observed = match self.motion {
            MotionKind::Turn => self.drive.heading()?,
            MotionKind::Straight => self.drive.distance()?,
        };
        if !observed.is_finite() {
            return Err(Error::Hardware(format!(
                "{} sensor returned {observed}",
                match self.motion {
                    MotionKind::Turn => "heading",
                    MotionKind::Straight => "distance",
                }
            )));
        }
        let result = TrialResult::new(index, target, observed);
        let unit = self.motion.unit();
        info!(
            trial = index,
            "observed {:.1} {}, error {:+.1} {}",
            observed,
            unit,
            result.signed_error,
            unit
        );

        if self.procedure.return_to_start && self.motion == MotionKind::Straight {
            debug!(distance = -target, "returning to start");
            self.drive.straight(-target).await?;
            pause(self.procedure.return_settle_ms).await;
        }

        self.drive.stop().await?;
        pause(self.procedure.post_stop_ms).await;

        self.reset_reference()?;
        pause(self.procedure.post_reset_ms).await;

        Ok(result)
    }

    async fn halt(&mut self) -> Result<()> {
        self.drive.stop().await
    }
}
