//! Straight-line performance suite
//!
//! Drives a list of named speed/distance patterns once each and records
//! distance error, heading drift, average speed and left/right wheel
//! rotation mismatch (a straightness indicator).

use crate::drive::{DriveBase, WheelSide};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

/// A named straight run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightPattern {
    /// Label used in the summary
    pub name: String,
    /// Cruise speed, mm/s
    pub speed_mm_s: f64,
    /// Commanded distance, mm
    pub distance_mm: f64,
}

impl StraightPattern {
    /// Create a pattern.
    #[must_use]
    pub fn new(name: impl Into<String>, speed_mm_s: f64, distance_mm: f64) -> Self {
        Self {
            name: name.into(),
            speed_mm_s,
            distance_mm,
        }
    }

    /// The standard twelve-run table: four speed bands over three distances,
    /// plus the drive base's top speed over a short run.
    #[must_use]
    pub fn standard_set() -> Vec<Self> {
        let bands = [
            ("slow", 100.0, &[200.0, 500.0, 1000.0][..]),
            ("medium", 200.0, &[200.0, 500.0, 1000.0][..]),
            ("fast", 300.0, &[200.0, 500.0, 1000.0][..]),
            ("top", 500.0, &[200.0, 500.0][..]),
            ("limit", 760.0, &[200.0][..]),
        ];
        bands
            .iter()
            .flat_map(|&(band, speed, distances)| {
                distances.iter().map(move |&distance| {
                    let length = if distance <= 200.0 {
                        "short"
                    } else if distance <= 500.0 {
                        "medium"
                    } else {
                        "long"
                    };
                    Self::new(format!("{band}/{length}"), speed, distance)
                })
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if !self.speed_mm_s.is_finite() || self.speed_mm_s <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "pattern {}: speed must be positive, got {}",
                self.name, self.speed_mm_s
            )));
        }
        if !self.distance_mm.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "pattern {}: distance must be finite",
                self.name
            )));
        }
        Ok(())
    }
}

/// Timing for the suite. Durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteOptions {
    /// Pause after stop before zeroing sensors
    pub reset_pause_ms: u64,
    /// Pause after zeroing, before the run starts
    pub settle_ms: u64,
    /// Seconds counted down before each run (time to reposition the robot)
    pub countdown_secs: u32,
    /// Pause between runs
    pub between_runs_ms: u64,
    /// Turn rate kept while changing the straight speed, deg/s
    pub turn_rate_deg_s: f64,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            reset_pause_ms: 100,
            settle_ms: 1000,
            countdown_secs: 5,
            between_runs_ms: 3000,
            turn_rate_deg_s: 150.0,
        }
    }
}

/// Measurements from one straight run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightMeasurement {
    /// Pattern that was driven
    pub pattern: StraightPattern,
    /// Odometry distance at the end, mm
    pub actual_distance_mm: f64,
    /// Time from command to completion
    pub elapsed: Duration,
    /// `actual / elapsed`, mm/s (0 if no time elapsed)
    pub average_speed_mm_s: f64,
    /// Heading change during the run, degrees
    pub heading_error_deg: f64,
    /// `actual - commanded`, mm
    pub distance_error_mm: f64,
    /// Left wheel rotation, degrees
    pub left_rotation_deg: f64,
    /// Right wheel rotation, degrees
    pub right_rotation_deg: f64,
    /// `|left - right|`, degrees
    pub motor_angle_diff_deg: f64,
}

impl StraightMeasurement {
    /// Distance error relative to the commanded distance, `None` for a zero-length run.
    #[must_use]
    pub fn distance_error_percent(&self) -> Option<f64> {
        if self.pattern.distance_mm == 0.0 {
            None
        } else {
            Some(self.distance_error_mm / self.pattern.distance_mm.abs() * 100.0)
        }
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Drive one pattern from a freshly zeroed state and measure it.
///
/// # Errors
///
/// Returns any drive-base error; the caller is responsible for stopping.
pub async fn measure_straight<D: DriveBase>(
    drive: &D,
    pattern: &StraightPattern,
    options: &SuiteOptions,
) -> Result<StraightMeasurement> {
    pattern.validate()?;

    drive.stop().await?;
    pause(options.reset_pause_ms).await;
    drive.reset_heading(0.0)?;
    drive.reset_distance()?;
    pause(options.settle_ms).await;

    let start_heading = drive.heading()?;
    let start_left = drive.wheel_angle(WheelSide::Left)?;
    let start_right = drive.wheel_angle(WheelSide::Right)?;

    drive.set_speeds(pattern.speed_mm_s, options.turn_rate_deg_s)?;
    let started = Instant::now();
    drive.straight(pattern.distance_mm).await?;
    let elapsed = started.elapsed();

    let actual_distance_mm = drive.distance()?;
    let left_rotation_deg = drive.wheel_angle(WheelSide::Left)? - start_left;
    let right_rotation_deg = drive.wheel_angle(WheelSide::Right)? - start_right;
    let seconds = elapsed.as_secs_f64();

    Ok(StraightMeasurement {
        pattern: pattern.clone(),
        actual_distance_mm,
        elapsed,
        average_speed_mm_s: if seconds > 0.0 {
            actual_distance_mm / seconds
        } else {
            0.0
        },
        heading_error_deg: drive.heading()? - start_heading,
        distance_error_mm: actual_distance_mm - pattern.distance_mm,
        left_rotation_deg,
        right_rotation_deg,
        motor_angle_diff_deg: (left_rotation_deg - right_rotation_deg).abs(),
    })
}

/// Where a suite stopped early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteAbort {
    /// 1-based run number
    pub run: usize,
    /// Pattern name
    pub pattern: String,
    /// Error message
    pub reason: String,
}

/// Results of a straight-line suite, in run order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightSuite {
    /// Completed runs
    pub measurements: Vec<StraightMeasurement>,
    /// Set if a fault ended the suite early
    pub abort: Option<SuiteAbort>,
}

impl StraightSuite {
    fn extreme_by(
        &self,
        key: impl Fn(&StraightMeasurement) -> f64,
        best: bool,
    ) -> Option<&StraightMeasurement> {
        self.measurements.iter().reduce(|acc, m| {
            let better = if best { key(m) < key(acc) } else { key(m) > key(acc) };
            if better {
                m
            } else {
                acc
            }
        })
    }

    /// Run with the smallest |distance error|.
    #[must_use]
    pub fn best_distance(&self) -> Option<&StraightMeasurement> {
        self.extreme_by(|m| m.distance_error_mm.abs(), true)
    }

    /// Run with the smallest |heading error|.
    #[must_use]
    pub fn best_heading(&self) -> Option<&StraightMeasurement> {
        self.extreme_by(|m| m.heading_error_deg.abs(), true)
    }

    /// Run with the largest |distance error|.
    #[must_use]
    pub fn worst_distance(&self) -> Option<&StraightMeasurement> {
        self.extreme_by(|m| m.distance_error_mm.abs(), false)
    }

    /// Run with the largest |heading error|.
    #[must_use]
    pub fn worst_heading(&self) -> Option<&StraightMeasurement> {
        self.extreme_by(|m| m.heading_error_deg.abs(), false)
    }
}

/// Drive every pattern in order.
///
/// A drive fault stops the robot and ends the suite; completed runs are kept.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] before any motion if a pattern is invalid.
pub async fn run_straight_suite<D: DriveBase>(
    drive: &D,
    patterns: &[StraightPattern],
    options: &SuiteOptions,
) -> Result<StraightSuite> {
    for pattern in patterns {
        pattern.validate()?;
    }

    let mut suite = StraightSuite {
        measurements: Vec::with_capacity(patterns.len()),
        abort: None,
    };

    for (i, pattern) in patterns.iter().enumerate() {
        let run = i + 1;
        info!(
            run,
            total = patterns.len(),
            "next: {} ({:.0} mm/s, {:.0} mm), place the robot at the start",
            pattern.name,
            pattern.speed_mm_s,
            pattern.distance_mm
        );
        for remaining in (1..=options.countdown_secs).rev() {
            info!("starting in {remaining} s");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        match measure_straight(drive, pattern, options).await {
            Ok(m) => {
                info!(
                    run,
                    "distance {:.1} mm (error {:+.1}), heading {:+.1} deg, {:.1} mm/s, wheel diff {:.1} deg",
                    m.actual_distance_mm,
                    m.distance_error_mm,
                    m.heading_error_deg,
                    m.average_speed_mm_s,
                    m.motor_angle_diff_deg
                );
                suite.measurements.push(m);
            }
            Err(e) => {
                error!(run, pattern = %pattern.name, "straight run failed, aborting suite: {e}");
                if let Err(stop_err) = drive.stop().await {
                    error!("fail-safe stop failed: {stop_err}");
                }
                suite.abort = Some(SuiteAbort {
                    run,
                    pattern: pattern.name.clone(),
                    reason: e.to_string(),
                });
                return Ok(suite);
            }
        }

        if run < patterns.len() {
            pause(options.between_runs_ms).await;
        }
    }

    drive.stop().await?;
    Ok(suite)
}

/// Per-run summary followed by best and worst runs.
#[must_use]
pub fn render_straight_suite(suite: &StraightSuite) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== straight performance summary ===");
    for (i, m) in suite.measurements.iter().enumerate() {
        let percent = m
            .distance_error_percent()
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:+.1}%"));
        let _ = writeln!(out, "[run {}] {}", i + 1, m.pattern.name);
        let _ = writeln!(
            out,
            "  distance: {:+.1} mm ({percent})",
            m.distance_error_mm
        );
        let _ = writeln!(out, "  heading:  {:+.1} deg", m.heading_error_deg);
        let _ = writeln!(
            out,
            "  speed:    {:.1} mm/s (target {:.0} mm/s)",
            m.average_speed_mm_s, m.pattern.speed_mm_s
        );
        let _ = writeln!(out, "  wheel diff: {:.1} deg", m.motor_angle_diff_deg);
    }

    if let (Some(bd), Some(bh), Some(wd), Some(wh)) = (
        suite.best_distance(),
        suite.best_heading(),
        suite.worst_distance(),
        suite.worst_heading(),
    ) {
        let _ = writeln!(out, "best:");
        let _ = writeln!(
            out,
            "  distance: {} ({:+.1} mm)",
            bd.pattern.name, bd.distance_error_mm
        );
        let _ = writeln!(
            out,
            "  heading:  {} ({:+.1} deg)",
            bh.pattern.name, bh.heading_error_deg
        );
        let _ = writeln!(out, "needs work:");
        let _ = writeln!(
            out,
            "  distance: {} ({:+.1} mm)",
            wd.pattern.name, wd.distance_error_mm
        );
        let _ = writeln!(
            out,
            "  heading:  {} ({:+.1} deg)",
            wh.pattern.name, wh.heading_error_deg
        );
    }

    if let Some(abort) = &suite.abort {
        let _ = writeln!(
            out,
            "ABORTED at run {} ({}): {}",
            abort.run, abort.pattern, abort.reason
        );
    }
    out
}
