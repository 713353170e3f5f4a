//! # drive-sweep: Accuracy Experiments for Differential-Drive Robots
//!
//! drive-sweep commands a two-wheel drive base through repeated turns or
//! straight runs across a grid of settings (motor power, target, speed),
//! measures how far each motion lands from its target, and reduces the
//! errors to per-setting tables. A telemetry logger samples the drive base
//! in the background while the experiment runs.
//!
//! ## Components
//!
//! - [`drive`]: the `DriveBase`/`Arm` capabilities plus a deterministic simulator
//! - [`experiment`]: trial executor, sweep controller, statistics, table rendering
//! - [`telemetry`]: periodic sensor logger with a cooperative stop signal
//! - [`session`]: runs an experiment beside the logger and always stops the robot
//! - [`performance`]: straight-line speed/distance suite
//! - [`mission`]: scripted step sequences
//! - [`config`]: JSON experiment configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use drive_sweep::drive::SimDriveBase;
//! use drive_sweep::experiment::{render, run_sweep, AxisKind, MotionKind, SweepPlan};
//! use drive_sweep::session::run_with_telemetry;
//! use drive_sweep::config::ExperimentConfig;
//!
//! # async fn example() -> drive_sweep::Result<()> {
//! let plan = SweepPlan::builder(MotionKind::Turn)
//!     .axis(AxisKind::MotorPowerPercent, [40.0, 55.0, 70.0, 85.0, 100.0])
//!     .fixed_target(60.0)
//!     .repeat(3)
//!     .build()?;
//! let config = ExperimentConfig::new(plan);
//! let robot = SimDriveBase::new(config.sim.clone());
//!
//! let mut executor = config.executor(&robot);
//! let report = run_with_telemetry(&robot, config.telemetry, &mut std::io::stdout(), async {
//!     run_sweep(&config.sweep, &mut executor).await
//! })
//! .await?;
//! println!("{}", render(&report));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod drive;
pub mod error;
pub mod experiment;
pub mod mission;
pub mod performance;
pub mod session;
pub mod telemetry;

pub use error::{Error, Result};
