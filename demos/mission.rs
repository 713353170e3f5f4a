//! Tower Lift Mission
//!
//! Runs the scripted tower-lift mission (or a mission JSON file given as the
//! first argument) on the simulated drive base and arm.
//!
//! Run with: cargo run --example mission [-- path/to/mission.json]

use drive_sweep::drive::{SimArm, SimDriveBase};
use drive_sweep::mission::{run_mission, Mission};
use drive_sweep::session::run_with_telemetry;
use drive_sweep::telemetry::TelemetryConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let mission = match std::env::args().nth(1) {
        Some(path) => Mission::from_json_str(&std::fs::read_to_string(path)?)?,
        None => Mission::tower_lift(),
    };

    let robot = SimDriveBase::default();
    let arm = SimArm::new();
    let telemetry = TelemetryConfig {
        enabled: true,
        period_ms: 200,
    };

    let steps = run_with_telemetry(&robot, telemetry, &mut std::io::stdout(), async {
        run_mission(&robot, Some(&arm), &mission).await
    })
    .await?;

    println!("{} complete: {steps} steps", mission.name);
    Ok(())
}
