//! Drive base capability consumed by the harness
//!
//! The robot platform (PID loops, gyro fusion, motor PWM) is a black box.
//! The harness only needs the handful of operations in [`DriveBase`]:
//! blocking-until-complete motions plus instantaneous sensor reads.
//!
//! # Example
//!
//! ```rust
//! use drive_sweep::drive::{DriveBase, SimDriveBase};
//!
//! # async fn example() -> drive_sweep::Result<()> {
//! let robot = SimDriveBase::default();
//! robot.turn(90.0).await?;
//! assert!(robot.heading()? > 0.0);
//! robot.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod sim;

pub use sim::{DriveGeometry, SimArm, SimConfig, SimDriveBase};

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Which drive wheel a reading refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelSide {
    /// Left drive motor
    Left,
    /// Right drive motor
    Right,
}

impl fmt::Display for WheelSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("L"),
            Self::Right => f.write_str("R"),
        }
    }
}

/// Two-motor differential drive base with an onboard heading sensor.
///
/// Motions complete before their future resolves. Everything takes `&self`:
/// the experiment task and the telemetry logger share one drive base on a
/// single-threaded runtime, so implementations keep their own interior
/// mutability and never hold it across an await.
pub trait DriveBase {
    /// Drive straight by `distance_mm` (negative drives backward).
    fn straight(&self, distance_mm: f64) -> impl Future<Output = Result<()>>;

    /// Turn in place by `angle_deg` (negative turns the other way).
    fn turn(&self, angle_deg: f64) -> impl Future<Output = Result<()>>;

    /// Stop both drive motors.
    fn stop(&self) -> impl Future<Output = Result<()>>;

    /// Cut drive motor power at once, without waiting for anything.
    ///
    /// Called from `Drop`, where [`DriveBase::stop`] cannot be awaited.
    ///
    /// # Errors
    ///
    /// Returns an error if the motors cannot be commanded.
    fn brake(&self) -> Result<()>;

    /// Set cruise speeds used by subsequent motions.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the settings.
    fn set_speeds(&self, straight_mm_per_s: f64, turn_deg_per_s: f64) -> Result<()>;

    /// Limit motor output to `percent` of full power.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the limit.
    fn set_power_limit(&self, percent: f64) -> Result<()>;

    /// Current heading in degrees (signed, unwrapped).
    ///
    /// # Errors
    ///
    /// Returns an error if the IMU cannot be read.
    fn heading(&self) -> Result<f64>;

    /// Redefine the current heading as `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the IMU cannot be reset.
    fn reset_heading(&self, value: f64) -> Result<()>;

    /// Distance travelled since the last [`DriveBase::reset_distance`], in mm.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoders cannot be read.
    fn distance(&self) -> Result<f64>;

    /// Zero the travelled distance and both wheel angles.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoders cannot be reset.
    fn reset_distance(&self) -> Result<()>;

    /// Accumulated rotation of one drive wheel, in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be read.
    fn wheel_angle(&self, side: WheelSide) -> Result<f64>;
}

/// Optional attachment motor (lift arm).
pub trait Arm {
    /// Rotate to `angle_deg` at `speed_deg_per_s`, completing when reached.
    fn run_target(&self, speed_deg_per_s: f64, angle_deg: f64)
        -> impl Future<Output = Result<()>>;

    /// Current arm angle in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be read.
    fn angle(&self) -> Result<f64>;

    /// Redefine the current arm angle as `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be reset.
    fn reset_angle(&self, value: f64) -> Result<()>;
}
