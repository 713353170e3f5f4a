//! Parameter-sweep accuracy experiments
//!
//! Runs a motion repeatedly across a grid of settings and reduces the
//! measured errors to a table.
//!
//! ## Data Flow
//!
//! ```text
//! SweepPlan ──> run_sweep ──> TrialExecutor::run_trial (repeat_num ×)
//!                  │                 │
//!                  │                 └──> TrialResult
//!                  └──> summarize ──> CombinationSummary ──> ExperimentReport ──> render
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use drive_sweep::drive::SimDriveBase;
//! use drive_sweep::experiment::{
//!     render, run_sweep, AxisKind, DriveTrialExecutor, MotionKind, SweepPlan, TrialProcedure,
//! };
//!
//! # async fn example() -> drive_sweep::Result<()> {
//! let robot = SimDriveBase::default();
//! let plan = SweepPlan::builder(MotionKind::Turn)
//!     .axis(AxisKind::MotorPowerPercent, [40.0, 70.0, 100.0])
//!     .fixed_target(60.0)
//!     .repeat(3)
//!     .build()?;
//!
//! let mut executor = DriveTrialExecutor::new(&robot, MotionKind::Turn)
//!     .with_procedure(TrialProcedure::immediate());
//! let report = run_sweep(&plan, &mut executor).await?;
//! println!("{}", render(&report));
//! # Ok(())
//! # }
//! ```

mod axis;
mod report;
mod stats;
mod sweep;
mod trial;

pub use axis::{combinations, Axis, AxisKind, LinkedValues, ParameterSetting};
pub use report::{render, render_accuracy, render_best};
pub use stats::{summarize, Accuracy, AccuracyGrade, ErrorStats};
pub use sweep::{
    run_sweep, CombinationSummary, ExperimentReport, SweepAbort, SweepPacing, SweepPlan,
    SweepPlanBuilder, SweepStatus,
};
pub use trial::{
    DriveTrialExecutor, MotionKind, SpeedProfile, TrialExecutor, TrialProcedure, TrialResult,
};
