//! Pairs an experiment task with the telemetry logger
//!
//! Both run inside the caller's task (`tokio::join!`), so they interleave
//! only at await points and share the drive base by plain reference. When
//! the experiment task finishes, successfully or not, the logger is told to
//! stop and the drive base is stopped. If the session future is dropped
//! before that (a timeout, a `select!` on Ctrl-C), the drive base is braked
//! synchronously instead.

use crate::drive::DriveBase;
use crate::telemetry::{stop_signal, TelemetryConfig, TelemetryLogger};
use crate::Result;
use std::future::Future;
use std::io::Write;
use tracing::{debug, error, warn};

/// Brakes the drive base unless disarmed before it is dropped.
struct BrakeOnDrop<'a, D: DriveBase> {
    drive: &'a D,
    armed: bool,
}

impl<'a, D: DriveBase> BrakeOnDrop<'a, D> {
    const fn new(drive: &'a D) -> Self {
        Self { drive, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<D: DriveBase> Drop for BrakeOnDrop<'_, D> {
    fn drop(&mut self) {
        if self.armed {
            warn!("session cancelled before the robot was stopped, braking");
            if let Err(e) = self.drive.brake() {
                error!("brake on cancel failed: {e}");
            }
        }
    }
}

/// Run `task` with telemetry going to `sink`, then stop the robot.
///
/// The drive base receives `stop()` whatever the task returns. A failing
/// stop is logged and does not replace the task's own result. Dropping the
/// returned future early calls [`DriveBase::brake`] instead.
///
/// # Errors
///
/// Returns whatever error `task` returned.
pub async fn run_with_telemetry<D, W, F, T>(
    drive: &D,
    config: TelemetryConfig,
    sink: &mut W,
    task: F,
) -> Result<T>
where
    D: DriveBase,
    W: Write,
    F: Future<Output = Result<T>>,
{
    let mut guard = BrakeOnDrop::new(drive);
    let (handle, signal) = stop_signal();

    let logger = async {
        if config.enabled {
            TelemetryLogger::new(drive, config.period(), signal)
                .run(sink)
                .await
        } else {
            0
        }
    };

    let experiment = async {
        let outcome = task.await;
        if let Err(e) = &outcome {
            error!("experiment task failed: {e}");
        }
        handle.stop();
        if let Err(e) = drive.stop().await {
            error!("fail-safe stop failed: {e}");
        }
        outcome
    };

    let (outcome, lines) = tokio::join!(experiment, logger);
    guard.disarm();
    debug!(lines, "session finished");
    outcome
}
