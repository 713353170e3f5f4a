//! Scripted missions
//!
//! A mission is a flat list of steps run one after another on the drive
//! base (and optionally an attachment arm). Missions load from JSON:
//!
//! ```json
//! { "name": "square", "steps": [
//!     { "step": "straight", "mm": 300 },
//!     { "step": "turn", "deg": 90 },
//!     { "step": "wait", "ms": 500 }
//! ] }
//! ```

use crate::drive::{Arm, DriveBase};
use crate::experiment::SpeedProfile;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

/// One mission step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum MissionStep {
    /// Drive straight
    Straight {
        /// Distance, mm (negative = backward)
        mm: f64,
    },
    /// Turn in place
    Turn {
        /// Angle, degrees
        deg: f64,
    },
    /// Pause
    Wait {
        /// Duration, ms
        ms: u64,
    },
    /// Move the arm to an absolute angle
    ArmTarget {
        /// Arm speed, deg/s
        speed: f64,
        /// Target angle, degrees
        angle: f64,
    },
    /// Change cruise speeds as a percentage of the profile maxima
    SetSpeeds {
        /// Straight speed, percent
        straight_percent: f64,
        /// Turn rate, percent
        turn_percent: f64,
    },
}

impl MissionStep {
    const fn needs_arm(&self) -> bool {
        matches!(self, Self::ArmTarget { .. })
    }
}

impl fmt::Display for MissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Straight { mm } => write!(f, "straight {mm:.0} mm"),
            Self::Turn { deg } => write!(f, "turn {deg:.0} deg"),
            Self::Wait { ms } => write!(f, "wait {ms} ms"),
            Self::ArmTarget { speed, angle } => {
                write!(f, "arm to {angle:.0} deg at {speed:.0} deg/s")
            }
            Self::SetSpeeds {
                straight_percent,
                turn_percent,
            } => write!(
                f,
                "speeds {straight_percent:.0}% straight, {turn_percent:.0}% turn"
            ),
        }
    }
}

/// A named step sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Name shown in logs
    pub name: String,
    /// Maxima that `SetSpeeds` percentages refer to
    #[serde(default)]
    pub speed_profile: SpeedProfile,
    /// Steps in order
    pub steps: Vec<MissionStep>,
}

impl Mission {
    /// Create a mission with the default speed profile.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<MissionStep>) -> Self {
        Self {
            name: name.into(),
            speed_profile: SpeedProfile::default(),
            steps,
        }
    }

    /// Drive to the tower and lift it: 260 mm out, turn -45 deg, 710 mm to
    /// the tower, arm up to 500 deg and back down, with 1 s pauses.
    #[must_use]
    pub fn tower_lift() -> Self {
        let pause = MissionStep::Wait { ms: 1000 };
        Self::new(
            "tower lift",
            vec![
                MissionStep::SetSpeeds {
                    straight_percent: 40.0,
                    turn_percent: 30.0,
                },
                MissionStep::Straight { mm: 260.0 },
                pause.clone(),
                MissionStep::Turn { deg: -45.0 },
                pause.clone(),
                MissionStep::Straight { mm: 710.0 },
                pause.clone(),
                MissionStep::ArmTarget {
                    speed: 180.0,
                    angle: 500.0,
                },
                pause,
                MissionStep::ArmTarget {
                    speed: 180.0,
                    angle: 0.0,
                },
            ],
        )
    }

    /// Turn `-angle`, then `+angle`, `count` times over with a 1 s pause
    /// after each turn.
    #[must_use]
    pub fn alternating_turns(angle_deg: f64, count: usize) -> Self {
        let steps = (0..count)
            .flat_map(|_| {
                [
                    MissionStep::Turn { deg: -angle_deg },
                    MissionStep::Wait { ms: 1000 },
                    MissionStep::Turn { deg: angle_deg },
                    MissionStep::Wait { ms: 1000 },
                ]
            })
            .collect();
        Self::new(format!("alternating turns {angle_deg:.0} deg"), steps)
    }

    /// Whether any step drives the arm.
    #[must_use]
    pub fn needs_arm(&self) -> bool {
        self.steps.iter().any(MissionStep::needs_arm)
    }

    /// Parse a mission from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

async fn run_step<D: DriveBase, A: Arm>(
    drive: &D,
    arm: Option<&A>,
    profile: &SpeedProfile,
    step: &MissionStep,
) -> Result<()> {
    match *step {
        MissionStep::Straight { mm } => drive.straight(mm).await,
        MissionStep::Turn { deg } => drive.turn(deg).await,
        MissionStep::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        }
        MissionStep::ArmTarget { speed, angle } => {
            arm.ok_or(Error::MissingArm)?.run_target(speed, angle).await
        }
        MissionStep::SetSpeeds {
            straight_percent,
            turn_percent,
        } => drive.set_speeds(
            profile.max_straight_speed_mm_s * straight_percent / 100.0,
            profile.max_turn_rate_deg_s * turn_percent / 100.0,
        ),
    }
}

/// Run every step in order, then stop the drive base.
///
/// Returns the number of steps executed.
///
/// # Errors
///
/// Returns [`Error::MissingArm`] before any motion if a step needs an arm
/// and none is attached. A failing step stops the drive base and its error
/// is returned.
pub async fn run_mission<D: DriveBase, A: Arm>(
    drive: &D,
    arm: Option<&A>,
    mission: &Mission,
) -> Result<usize> {
    if arm.is_none() && mission.needs_arm() {
        return Err(Error::MissingArm);
    }

    info!(mission = %mission.name, steps = mission.steps.len(), "mission started");
    for (i, step) in mission.steps.iter().enumerate() {
        info!(step = i + 1, "{step}");
        if let Err(e) = run_step(drive, arm, &mission.speed_profile, step).await {
            error!(step = i + 1, "mission step failed: {e}");
            if let Err(stop_err) = drive.stop().await {
                error!("fail-safe stop failed: {stop_err}");
            }
            return Err(e);
        }
    }
    drive.stop().await?;
    info!(mission = %mission.name, "mission complete");
    Ok(mission.steps.len())
}
