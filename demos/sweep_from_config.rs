//! Sweep From a JSON Configuration
//!
//! Loads an experiment configuration (default:
//! `demos/configs/turn_speed_by_angle.json`) and runs it on the simulated
//! drive base described by its `sim` section. Ctrl-C cancels the session,
//! which brakes the drive base.
//!
//! Run with: cargo run --example sweep_from_config [-- path/to/config.json]

use anyhow::Context;
use drive_sweep::config::ExperimentConfig;
use drive_sweep::drive::SimDriveBase;
use drive_sweep::experiment::{render, render_accuracy, render_best, run_sweep};
use drive_sweep::session::run_with_telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/configs/turn_speed_by_angle.json".to_string());
    let config =
        ExperimentConfig::from_path(&path).with_context(|| format!("loading {path}"))?;

    let robot = SimDriveBase::new(config.sim.clone());
    let mut executor = config.executor(&robot);

    let mut stdout = std::io::stdout();
    let session = run_with_telemetry(&robot, config.telemetry, &mut stdout, async {
        run_sweep(&config.sweep, &mut executor).await
    });
    let report = tokio::select! {
        report = session => report?,
        _ = tokio::signal::ctrl_c() => anyhow::bail!("interrupted, drive base braked"),
    };

    println!();
    println!("{}", render(&report));
    println!("{}", render_accuracy(&report));
    println!("{}", render_best(&report));
    if !report.is_complete() {
        anyhow::bail!("sweep did not complete");
    }
    Ok(())
}
