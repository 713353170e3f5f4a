//! Periodic telemetry logger
//!
//! Samples the drive base on a fixed period and writes one line per sample.
//! Runs beside the experiment on the same single-threaded runtime; it only
//! reads the drive base and never holds anything across its wait.
//!
//! Logged values are advisory. Trials take their own measurements.

use crate::drive::{DriveBase, WheelSide};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Telemetry settings. The period is in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Run the logger at all
    pub enabled: bool,
    /// Sampling period
    pub period_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: 500,
        }
    }
}

impl TelemetryConfig {
    /// Sampling period as a `Duration`.
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// One reading of the drive base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Distance since the last odometry reset, mm
    pub distance_mm: f64,
    /// Heading, degrees
    pub heading_deg: f64,
    /// Left wheel angle, degrees
    pub left_deg: f64,
    /// Right wheel angle, degrees
    pub right_deg: f64,
}

impl TelemetrySample {
    /// Read every field from `drive`.
    ///
    /// # Errors
    ///
    /// Returns the first sensor read error.
    pub fn read<D: DriveBase>(drive: &D) -> Result<Self> {
        Ok(Self {
            distance_mm: drive.distance()?,
            heading_deg: drive.heading()?,
            left_deg: drive.wheel_angle(WheelSide::Left)?,
            right_deg: drive.wheel_angle(WheelSide::Right)?,
        })
    }
}

impl fmt::Display for TelemetrySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LOG: dist={:4.0} mm  heading={:4.0}°  L={:5.0}°  R={:5.0}°",
            self.distance_mm, self.heading_deg, self.left_deg, self.right_deg
        )
    }
}

/// Sending half of a stop signal.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Raise the stop flag. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half of a stop signal.
///
/// Dropping the [`StopHandle`] counts as a stop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Whether stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once stop is requested.
    pub async fn stopped(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Create a linked stop handle and signal.
#[must_use]
pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Telemetry loop over a shared drive base.
#[derive(Debug)]
pub struct TelemetryLogger<'a, D> {
    drive: &'a D,
    period: Duration,
    stop: StopSignal,
}

impl<'a, D: DriveBase> TelemetryLogger<'a, D> {
    /// Create a logger sampling every `period` until `stop` fires.
    #[must_use]
    pub const fn new(drive: &'a D, period: Duration, stop: StopSignal) -> Self {
        Self {
            drive,
            period,
            stop,
        }
    }

    /// Sample and write lines to `sink` until stopped. Returns the number of
    /// lines written.
    ///
    /// Sensor and sink failures are logged and skipped; they never end the
    /// loop or reach the experiment task.
    pub async fn run<W: Write>(mut self, sink: &mut W) -> usize {
        info!(period = ?self.period, "telemetry logger started");
        let mut lines = 0;
        loop {
            if self.stop.is_stopped() {
                break;
            }
            match TelemetrySample::read(self.drive) {
                Ok(sample) => {
                    if let Err(e) = writeln!(sink, "{sample}") {
                        warn!("telemetry write failed: {e}");
                    } else {
                        lines += 1;
                    }
                }
                Err(e) => warn!("telemetry sample failed: {e}"),
            }

            tokio::select! {
                () = self.stop.stopped() => break,
                () = tokio::time::sleep(self.period) => {}
            }
        }
        debug!(lines, "telemetry logger stopped");
        lines
    }
}
