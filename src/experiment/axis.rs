//! Sweep axes and parameter settings

use serde::{Deserialize, Serialize};
use std::fmt;

/// What one sweep dimension varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    /// Motor output limit, percent of full power
    MotorPowerPercent,
    /// Commanded turn angle, degrees
    TargetAngleDeg,
    /// Commanded straight distance, mm
    TargetDistanceMm,
    /// Straight cruise speed, percent of the profile maximum
    StraightSpeedPercent,
    /// Turn rate, percent of the profile maximum
    TurnSpeedPercent,
}

impl AxisKind {
    /// Stable snake-case name used in reports and configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MotorPowerPercent => "motor_power_percent",
            Self::TargetAngleDeg => "target_angle_deg",
            Self::TargetDistanceMm => "target_distance_mm",
            Self::StraightSpeedPercent => "straight_speed_percent",
            Self::TurnSpeedPercent => "turn_speed_percent",
        }
    }

    /// Unit label for table headers.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::MotorPowerPercent | Self::StraightSpeedPercent | Self::TurnSpeedPercent => "%",
            Self::TargetAngleDeg => "deg",
            Self::TargetDistanceMm => "mm",
        }
    }

    /// Whether values on this axis are motion targets rather than settings.
    #[must_use]
    pub const fn is_target(self) -> bool {
        matches!(self, Self::TargetAngleDeg | Self::TargetDistanceMm)
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values of a parameter that steps together with its axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedValues {
    /// Parameter set alongside the axis
    pub kind: AxisKind,
    /// One value per step of the axis
    pub values: Vec<f64>,
}

/// One sweep dimension: a parameter and the ordered values to try.
///
/// Linked parameters are zipped onto the axis rather than crossed with it:
/// step `i` sets `values[i]` and every `linked[j].values[i]`, e.g. paired
/// straight and turn speeds `(15, 10), (30, 25), ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Parameter varied along this axis
    pub kind: AxisKind,
    /// Values in sweep order
    pub values: Vec<f64>,
    /// Parameters stepped in lockstep with `kind`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked: Vec<LinkedValues>,
}

impl Axis {
    /// Create an axis.
    #[must_use]
    pub fn new(kind: AxisKind, values: impl Into<Vec<f64>>) -> Self {
        Self {
            kind,
            values: values.into(),
            linked: Vec::new(),
        }
    }

    /// Step `kind` in lockstep with this axis.
    #[must_use]
    pub fn linked(mut self, kind: AxisKind, values: impl Into<Vec<f64>>) -> Self {
        self.linked.push(LinkedValues {
            kind,
            values: values.into(),
        });
        self
    }

    /// Number of steps; the shortest value list wins if lengths differ.
    #[must_use]
    pub fn len(&self) -> usize {
        self.linked
            .iter()
            .map(|l| l.values.len())
            .fold(self.values.len(), usize::min)
    }

    /// Whether the axis has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn step(&self, i: usize) -> impl Iterator<Item = (AxisKind, f64)> + '_ {
        std::iter::once((self.kind, self.values[i]))
            .chain(self.linked.iter().map(move |l| (l.kind, l.values[i])))
    }
}

/// One point in the sweep space.
///
/// Holds one value per parameter, in axis declaration order (an axis's
/// linked parameters follow its own). Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSetting {
    values: Vec<(AxisKind, f64)>,
}

impl ParameterSetting {
    /// Build a setting from `(axis, value)` pairs.
    #[must_use]
    pub fn new(values: impl Into<Vec<(AxisKind, f64)>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Value for `kind`, if the setting has that axis.
    #[must_use]
    pub fn get(&self, kind: AxisKind) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|&(_, v)| v)
    }

    /// `(axis, value)` pairs in declaration order.
    #[must_use]
    pub fn values(&self) -> &[(AxisKind, f64)] {
        &self.values
    }

    /// Number of parameters in this setting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the setting has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for ParameterSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (kind, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}={value:.1}")?;
        }
        Ok(())
    }
}

/// Cartesian product of `axes`, first axis varying slowest.
///
/// Any axis with no values makes the product empty. An empty axis list
/// yields exactly one empty setting.
#[must_use]
pub fn combinations(axes: &[Axis]) -> Vec<ParameterSetting> {
    let mut settings: Vec<Vec<(AxisKind, f64)>> = vec![Vec::with_capacity(axes.len())];
    for axis in axes {
        settings = settings
            .into_iter()
            .flat_map(|prefix| {
                (0..axis.len()).map(move |i| {
                    let mut next = prefix.clone();
                    next.extend(axis.step(i));
                    next
                })
            })
            .collect();
    }
    settings.into_iter().map(ParameterSetting::new).collect()
}
