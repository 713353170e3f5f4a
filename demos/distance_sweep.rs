//! Straight Accuracy vs Power and Distance
//!
//! Two-axis sweep: motor power (outer) by target distance (inner), with
//! the robot driving back to its start line after every trial.
//!
//! Run with: cargo run --example distance_sweep

use drive_sweep::drive::{SimConfig, SimDriveBase};
use drive_sweep::experiment::{
    render, render_best, run_sweep, AxisKind, DriveTrialExecutor, MotionKind, SweepPlan,
    TrialProcedure,
};
use drive_sweep::session::run_with_telemetry;
use drive_sweep::telemetry::TelemetryConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let robot = SimDriveBase::new(SimConfig {
        straight_scale: 1.004,
        straight_bias_mm: 0.8,
        wheel_skew: 0.003,
        ..SimConfig::default()
    });

    let plan = SweepPlan::builder(MotionKind::Straight)
        .axis(AxisKind::MotorPowerPercent, [40.0, 55.0, 70.0])
        .axis(AxisKind::TargetDistanceMm, [20.0, 40.0, 60.0, 80.0, 100.0, 120.0])
        .repeat(3)
        .build()?;

    let mut executor = DriveTrialExecutor::new(&robot, MotionKind::Straight).with_procedure(
        TrialProcedure {
            settle_ms: 200,
            post_stop_ms: 50,
            post_reset_ms: 100,
            return_to_start: true,
            return_settle_ms: 100,
        },
    );

    let report = run_with_telemetry(
        &robot,
        TelemetryConfig::default(),
        &mut std::io::stdout(),
        async { run_sweep(&plan, &mut executor).await },
    )
    .await?;

    println!();
    println!("{}", render(&report));
    println!("{}", render_best(&report));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
