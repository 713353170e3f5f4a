//! Straight-Line Performance Suite
//!
//! Drives the standard twelve speed/distance patterns and reports distance
//! error, heading drift and left/right wheel mismatch for each.
//!
//! Run with: cargo run --example straight_performance

use drive_sweep::drive::{SimConfig, SimDriveBase};
use drive_sweep::performance::{
    render_straight_suite, run_straight_suite, StraightPattern, SuiteOptions,
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
        straight_bias_mm: 1.5,
        wheel_skew: 0.004,
        ..SimConfig::default()
    });
    let options = SuiteOptions {
        countdown_secs: 1,
        between_runs_ms: 500,
        settle_ms: 300,
        ..SuiteOptions::default()
    };
    let patterns = StraightPattern::standard_set();

    let telemetry = TelemetryConfig {
        enabled: true,
        period_ms: 1000,
    };
    let suite = run_with_telemetry(&robot, telemetry, &mut std::io::stdout(), async {
        run_straight_suite(&robot, &patterns, &options).await
    })
    .await?;

    println!();
    print!("{}", render_straight_suite(&suite));
    Ok(())
}
