//! Turn Accuracy vs Motor Power
//!
//! Sweeps motor power over 40..100% for a fixed 60 degree turn on the
//! simulated drive base and prints the error tables.
//!
//! Run with: cargo run --example turn_power_sweep

use drive_sweep::drive::{SimConfig, SimDriveBase};
use drive_sweep::experiment::{
    render, render_accuracy, render_best, run_sweep, AxisKind, DriveTrialExecutor, MotionKind,
    SpeedProfile, SweepPacing, SweepPlan, TrialProcedure,
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

    // Faster turns overshoot more, like a real hub with aggressive gains
    let robot = SimDriveBase::new(SimConfig {
        max_turn_rate_deg_s: 500.0,
        turn_bias_deg: 0.4,
        overshoot_per_100_deg_per_s: 0.6,
        ..SimConfig::default()
    });

    let plan = SweepPlan::builder(MotionKind::Turn)
        .axis(AxisKind::MotorPowerPercent, [40.0, 55.0, 70.0, 85.0, 100.0])
        .fixed_target(60.0)
        .repeat(3)
        .pacing(SweepPacing {
            countdown_secs: 0,
            inter_combination_pause_ms: 500,
        })
        .build()?;

    let mut executor = DriveTrialExecutor::new(&robot, MotionKind::Turn)
        .with_speed_profile(SpeedProfile {
            turn_speed_percent: 80.0,
            ..SpeedProfile::default()
        })
        .with_procedure(TrialProcedure {
            settle_ms: 300,
            post_stop_ms: 100,
            post_reset_ms: 100,
            ..TrialProcedure::default()
        });

    let telemetry = TelemetryConfig {
        enabled: true,
        period_ms: 250,
    };
    let report = run_with_telemetry(&robot, telemetry, &mut std::io::stdout(), async {
        run_sweep(&plan, &mut executor).await
    })
    .await?;

    println!();
    println!("{}", render(&report));
    println!("{}", render_accuracy(&report));
    println!("{}", render_best(&report));
    Ok(())
}
