//! Simulated drive base for demos and tests
//!
//! Deterministic kinematic model of a two-wheel drive base. Motions advance
//! in ticks on the tokio clock, so a concurrently running telemetry logger
//! sees intermediate state exactly as it would on a real hub.
//!
//! Systematic error knobs (`turn_scale`, `turn_bias_deg`,
//! `overshoot_per_100_deg_per_s`, `straight_scale`, `straight_bias_mm`,
//! `wheel_skew`) stand in for the inaccuracies a sweep is meant to measure.

use super::{Arm, DriveBase, WheelSide};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::f64::consts::PI;
use std::time::Duration;

/// Wheel and chassis dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveGeometry {
    /// Drive wheel diameter in mm
    pub wheel_diameter_mm: f64,
    /// Distance between the wheel contact points in mm
    pub axle_track_mm: f64,
}

impl Default for DriveGeometry {
    fn default() -> Self {
        Self {
            wheel_diameter_mm: 56.0,
            axle_track_mm: 115.0,
        }
    }
}

impl DriveGeometry {
    /// Wheel rotation (degrees) needed to roll `mm` of ground.
    #[must_use]
    pub fn wheel_degrees(&self, mm: f64) -> f64 {
        mm / (PI * self.wheel_diameter_mm) * 360.0
    }

    /// Ground travel of each wheel (mm) for an in-place turn of `angle_deg`.
    #[must_use]
    pub fn turn_arc_mm(&self, angle_deg: f64) -> f64 {
        PI * self.axle_track_mm * angle_deg / 360.0
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Chassis geometry
    pub geometry: DriveGeometry,
    /// Top straight speed at 100% power, mm/s
    pub max_straight_speed_mm_s: f64,
    /// Top turn rate at 100% power, deg/s
    pub max_turn_rate_deg_s: f64,
    /// Multiplicative turn error (1.0 = exact)
    pub turn_scale: f64,
    /// Constant overshoot added in the direction of every turn, degrees
    pub turn_bias_deg: f64,
    /// Extra overshoot per 100 deg/s of effective turn rate, degrees
    pub overshoot_per_100_deg_per_s: f64,
    /// Multiplicative distance error (1.0 = exact)
    pub straight_scale: f64,
    /// Constant overshoot added in the direction of every straight run, mm
    pub straight_bias_mm: f64,
    /// Fractional left/right travel mismatch on straight runs
    /// (positive = left wheel travels further, robot veers clockwise)
    pub wheel_skew: f64,
    /// Simulation step in milliseconds
    pub tick_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            geometry: DriveGeometry::default(),
            max_straight_speed_mm_s: 1000.0,
            max_turn_rate_deg_s: 1000.0,
            turn_scale: 1.0,
            turn_bias_deg: 0.0,
            overshoot_per_100_deg_per_s: 0.0,
            straight_scale: 1.0,
            straight_bias_mm: 0.0,
            wheel_skew: 0.0,
            tick_ms: 10,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Pose {
    heading: f64,
    distance: f64,
    left_deg: f64,
    right_deg: f64,
}

/// Deterministic in-memory drive base.
///
/// Single-threaded by construction (`Cell` state); share it by reference
/// between the experiment task and the telemetry logger.
#[derive(Debug)]
pub struct SimDriveBase {
    config: SimConfig,
    pose: Cell<Pose>,
    straight_speed: Cell<f64>,
    turn_rate: Cell<f64>,
    power_limit: Cell<f64>,
    motions: Cell<u32>,
    stops: Cell<u32>,
    fail_on: Cell<Option<u32>>,
}

impl SimDriveBase {
    /// Create a simulated drive base at rest with 200 mm/s, 150 deg/s and full power.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            pose: Cell::new(Pose::default()),
            straight_speed: Cell::new(200.0),
            turn_rate: Cell::new(150.0),
            power_limit: Cell::new(100.0),
            motions: Cell::new(0),
            stops: Cell::new(0),
            fail_on: Cell::new(None),
        }
    }

    /// Simulation parameters in use.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Make the `n`-th motion command (1-based, straight or turn) fail with a hardware fault.
    pub fn fail_on_motion(&self, n: u32) {
        self.fail_on.set(Some(n));
    }

    /// Number of motion commands issued so far (including a failed one).
    #[must_use]
    pub fn motion_count(&self) -> u32 {
        self.motions.get()
    }

    /// Number of `stop()` and `brake()` calls so far.
    #[must_use]
    pub fn stop_count(&self) -> u32 {
        self.stops.get()
    }

    /// Commanded `(straight mm/s, turn deg/s)`.
    #[must_use]
    pub fn speeds(&self) -> (f64, f64) {
        (self.straight_speed.get(), self.turn_rate.get())
    }

    /// Current motor power limit, percent.
    #[must_use]
    pub fn power_limit(&self) -> f64 {
        self.power_limit.get()
    }

    fn begin_motion(&self) -> Result<()> {
        let n = self.motions.get() + 1;
        self.motions.set(n);
        if self.fail_on.get() == Some(n) {
            return Err(Error::Hardware(format!(
                "drive motor stopped responding during motion {n}"
            )));
        }
        Ok(())
    }

    fn effective(commanded: f64, max: f64, power_percent: f64) -> f64 {
        commanded.min(max * power_percent / 100.0)
    }

    fn effective_straight_speed(&self) -> f64 {
        Self::effective(
            self.straight_speed.get(),
            self.config.max_straight_speed_mm_s,
            self.power_limit.get(),
        )
    }

    fn effective_turn_rate(&self) -> f64 {
        Self::effective(
            self.turn_rate.get(),
            self.config.max_turn_rate_deg_s,
            self.power_limit.get(),
        )
    }

    /// Apply `delta` to the pose over `travel / speed` seconds in ticks.
    async fn animate(&self, delta: Pose, travel: f64, speed: f64) -> Result<()> {
        if travel == 0.0 {
            tokio::task::yield_now().await;
            return Ok(());
        }
        let total = motion_time(travel, speed).ok_or_else(|| {
            Error::Hardware(format!(
                "drive stalled: effective speed {speed} cannot complete the motion"
            ))
        })?;
        let tick = Duration::from_millis(self.config.tick_ms.max(1));
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let steps = (total.as_secs_f64() / tick.as_secs_f64()).ceil().max(1.0) as u32;
        let step_time = total / steps;
        let fraction = 1.0 / f64::from(steps);

        for _ in 0..steps {
            let mut pose = self.pose.get();
            pose.heading += delta.heading * fraction;
            pose.distance += delta.distance * fraction;
            pose.left_deg += delta.left_deg * fraction;
            pose.right_deg += delta.right_deg * fraction;
            self.pose.set(pose);
            tokio::time::sleep(step_time).await;
        }
        Ok(())
    }
}

impl Default for SimDriveBase {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// Longest motion the simulator will play out; anything slower is a stall.
const MAX_MOTION: Duration = Duration::from_secs(3600);

/// Time to cover `travel` at `speed`, `None` if the motion would never finish.
fn motion_time(travel: f64, speed: f64) -> Option<Duration> {
    if speed <= 0.0 || !speed.is_finite() {
        return None;
    }
    Duration::try_from_secs_f64(travel.abs() / speed)
        .ok()
        .filter(|total| *total <= MAX_MOTION)
}

fn finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::Hardware(format!("{what} must be finite, got {value}")))
    }
}

impl DriveBase for SimDriveBase {
    async fn straight(&self, distance_mm: f64) -> Result<()> {
        let distance_mm = finite(distance_mm, "straight distance")?;
        self.begin_motion()?;

        let cfg = &self.config;
        let travelled =
            distance_mm * cfg.straight_scale + distance_mm.signum() * cfg.straight_bias_mm;
        let left_mm = travelled * (1.0 + cfg.wheel_skew / 2.0);
        let right_mm = travelled * (1.0 - cfg.wheel_skew / 2.0);

        let delta = Pose {
            heading: ((left_mm - right_mm) / cfg.geometry.axle_track_mm).to_degrees(),
            distance: (left_mm + right_mm) / 2.0,
            left_deg: cfg.geometry.wheel_degrees(left_mm),
            right_deg: cfg.geometry.wheel_degrees(right_mm),
        };
        self.animate(delta, travelled, self.effective_straight_speed())
            .await
    }

    async fn turn(&self, angle_deg: f64) -> Result<()> {
        let angle_deg = finite(angle_deg, "turn angle")?;
        self.begin_motion()?;

        let cfg = &self.config;
        let rate = self.effective_turn_rate();
        let overshoot = cfg.turn_bias_deg + cfg.overshoot_per_100_deg_per_s * rate / 100.0;
        let turned = angle_deg * cfg.turn_scale + angle_deg.signum() * overshoot;
        let arc = cfg.geometry.turn_arc_mm(turned);

        let delta = Pose {
            heading: turned,
            distance: 0.0,
            left_deg: cfg.geometry.wheel_degrees(arc),
            right_deg: -cfg.geometry.wheel_degrees(arc),
        };
        self.animate(delta, turned, rate).await
    }

    async fn stop(&self) -> Result<()> {
        self.brake()
    }

    fn brake(&self) -> Result<()> {
        self.stops.set(self.stops.get() + 1);
        Ok(())
    }

    fn set_speeds(&self, straight_mm_per_s: f64, turn_deg_per_s: f64) -> Result<()> {
        let straight = finite(straight_mm_per_s, "straight speed")?;
        let turn = finite(turn_deg_per_s, "turn rate")?;
        if straight < 0.0 || turn < 0.0 {
            return Err(Error::Hardware(format!(
                "speeds must be non-negative, got {straight} mm/s and {turn} deg/s"
            )));
        }
        self.straight_speed.set(straight);
        self.turn_rate.set(turn);
        Ok(())
    }

    fn set_power_limit(&self, percent: f64) -> Result<()> {
        let percent = finite(percent, "power limit")?;
        if percent < 0.0 {
            return Err(Error::Hardware(format!(
                "power limit must be non-negative, got {percent}%"
            )));
        }
        self.power_limit.set(percent);
        Ok(())
    }

    fn heading(&self) -> Result<f64> {
        Ok(self.pose.get().heading)
    }

    fn reset_heading(&self, value: f64) -> Result<()> {
        let mut pose = self.pose.get();
        pose.heading = value;
        self.pose.set(pose);
        Ok(())
    }

    fn distance(&self) -> Result<f64> {
        Ok(self.pose.get().distance)
    }

    fn reset_distance(&self) -> Result<()> {
        let mut pose = self.pose.get();
        pose.distance = 0.0;
        pose.left_deg = 0.0;
        pose.right_deg = 0.0;
        self.pose.set(pose);
        Ok(())
    }

    fn wheel_angle(&self, side: WheelSide) -> Result<f64> {
        let pose = self.pose.get();
        Ok(match side {
            WheelSide::Left => pose.left_deg,
            WheelSide::Right => pose.right_deg,
        })
    }
}

/// Simulated attachment motor.
#[derive(Debug)]
pub struct SimArm {
    angle: Cell<f64>,
    tick: Duration,
}

impl SimArm {
    /// Create an arm at 0 degrees.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            angle: Cell::new(0.0),
            tick: Duration::from_millis(10),
        }
    }
}

impl Default for SimArm {
    fn default() -> Self {
        Self::new()
    }
}

impl Arm for SimArm {
    async fn run_target(&self, speed_deg_per_s: f64, angle_deg: f64) -> Result<()> {
        let target = finite(angle_deg, "arm target")?;
        let speed = speed_deg_per_s.abs();
        let start = self.angle.get();
        let travel = target - start;
        if travel == 0.0 {
            tokio::task::yield_now().await;
            return Ok(());
        }
        let total = motion_time(travel, speed).ok_or_else(|| {
            Error::Hardware(format!(
                "arm stalled: speed {speed_deg_per_s} cannot reach {target}"
            ))
        })?;
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let steps = (total.as_secs_f64() / self.tick.as_secs_f64()).ceil().max(1.0) as u32;
        for step in 1..=steps {
            self.angle
                .set(start + travel * f64::from(step) / f64::from(steps));
            tokio::time::sleep(total / steps).await;
        }
        Ok(())
    }

    fn angle(&self) -> Result<f64> {
        Ok(self.angle.get())
    }

    fn reset_angle(&self, value: f64) -> Result<()> {
        self.angle.set(value);
        Ok(())
    }
}
