//! Sweep controller: nested parameter loops over repeated trials

use super::stats::{summarize, ErrorStats};
use super::trial::{MotionKind, TrialExecutor, TrialResult};
use super::{combinations, Axis, AxisKind, ParameterSetting};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pauses between combinations. Durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPacing {
    /// Seconds counted down (one log line each) before every combination
    pub countdown_secs: u32,
    /// Pause between consecutive combinations
    pub inter_combination_pause_ms: u64,
}

/// A validated description of what to sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    /// Motion commanded by every trial
    pub motion: MotionKind,
    /// Axes in nesting order (first varies slowest)
    pub axes: Vec<Axis>,
    /// Trials per combination
    pub repeat_num: usize,
    /// Target used when no axis carries one
    #[serde(default)]
    pub fixed_target: Option<f64>,
    /// Pauses between combinations
    #[serde(default)]
    pub pacing: SweepPacing,
}

impl SweepPlan {
    /// Start building a plan for `motion`.
    #[must_use]
    pub fn builder(motion: MotionKind) -> SweepPlanBuilder {
        SweepPlanBuilder::new(motion)
    }

    /// Check the plan before anything moves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `repeat_num` is zero, there are no
    /// axes, a parameter is repeated or holds a non-finite value, linked
    /// values do not match their axis in length, or the target source is
    /// missing, ambiguous or does not match the motion.
    pub fn validate(&self) -> Result<()> {
        if self.repeat_num == 0 {
            return Err(Error::InvalidConfig(
                "repeat_num must be at least 1".to_string(),
            ));
        }
        if self.axes.is_empty() {
            return Err(Error::InvalidConfig(
                "a sweep needs at least one axis".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for axis in &self.axes {
            for linked in &axis.linked {
                if linked.values.len() != axis.values.len() {
                    return Err(Error::InvalidConfig(format!(
                        "axis {} has {} values but linked {} has {}",
                        axis.kind,
                        axis.values.len(),
                        linked.kind,
                        linked.values.len()
                    )));
                }
            }
            let value_lists = std::iter::once((axis.kind, &axis.values))
                .chain(axis.linked.iter().map(|l| (l.kind, &l.values)));
            for (kind, values) in value_lists {
                if !seen.insert(kind) {
                    return Err(Error::InvalidConfig(format!(
                        "axis {kind} is declared more than once"
                    )));
                }
                if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                    return Err(Error::InvalidConfig(format!(
                        "axis {kind} contains non-finite value {bad}"
                    )));
                }
                if kind.is_target() && kind != self.motion.target_axis() {
                    return Err(Error::InvalidConfig(format!(
                        "axis {kind} cannot drive {:?} trials (expected {})",
                        self.motion,
                        self.motion.target_axis()
                    )));
                }
            }
        }

        let has_target_axis = seen.contains(&self.motion.target_axis());
        match (has_target_axis, self.fixed_target) {
            (true, Some(_)) => Err(Error::InvalidConfig(format!(
                "both a {} axis and a fixed target were given",
                self.motion.target_axis()
            ))),
            (false, None) => Err(Error::InvalidConfig(format!(
                "no target: add a {} axis or a fixed target",
                self.motion.target_axis()
            ))),
            (false, Some(target)) if !target.is_finite() => Err(Error::InvalidConfig(format!(
                "fixed target must be finite, got {target}"
            ))),
            _ => Ok(()),
        }
    }

    /// Every combination in sweep order.
    #[must_use]
    pub fn combinations(&self) -> Vec<ParameterSetting> {
        combinations(&self.axes)
    }

    /// Target for a combination of this plan.
    #[must_use]
    pub fn target_for(&self, setting: &ParameterSetting) -> Option<f64> {
        self.fixed_target
            .or_else(|| setting.get(self.motion.target_axis()))
    }

    /// Axis kinds in declaration order (linked parameters excluded).
    #[must_use]
    pub fn axis_kinds(&self) -> Vec<AxisKind> {
        self.axes.iter().map(|a| a.kind).collect()
    }
}

/// Builder for [`SweepPlan`].
#[derive(Debug)]
pub struct SweepPlanBuilder {
    motion: MotionKind,
    axes: Vec<Axis>,
    repeat_num: usize,
    fixed_target: Option<f64>,
    pacing: SweepPacing,
}

impl SweepPlanBuilder {
    /// New builder; `repeat_num` defaults to 3.
    #[must_use]
    pub const fn new(motion: MotionKind) -> Self {
        Self {
            motion,
            axes: Vec::new(),
            repeat_num: 3,
            fixed_target: None,
            pacing: SweepPacing {
                countdown_secs: 0,
                inter_combination_pause_ms: 0,
            },
        }
    }

    /// Append an axis (nested inside the previous ones).
    #[must_use]
    pub fn axis(mut self, kind: AxisKind, values: impl Into<Vec<f64>>) -> Self {
        self.axes.push(Axis::new(kind, values));
        self
    }

    /// Append a prebuilt axis, e.g. one with linked parameters.
    #[must_use]
    pub fn push_axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    /// Trials per combination.
    #[must_use]
    pub const fn repeat(mut self, repeat_num: usize) -> Self {
        self.repeat_num = repeat_num;
        self
    }

    /// Use the same target for every combination.
    #[must_use]
    pub const fn fixed_target(mut self, target: f64) -> Self {
        self.fixed_target = Some(target);
        self
    }

    /// Pauses between combinations.
    #[must_use]
    pub const fn pacing(mut self, pacing: SweepPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Validate and build the plan.
    ///
    /// # Errors
    ///
    /// See [`SweepPlan::validate`].
    pub fn build(self) -> Result<SweepPlan> {
        let plan = SweepPlan {
            motion: self.motion,
            axes: self.axes,
            repeat_num: self.repeat_num,
            fixed_target: self.fixed_target,
            pacing: self.pacing,
        };
        plan.validate()?;
        Ok(plan)
    }
}

/// All trials of one combination and their statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationSummary {
    /// Settings applied for these trials
    pub setting: ParameterSetting,
    /// Target commanded in every trial
    pub target: f64,
    /// Trials in execution order
    pub trials: Vec<TrialResult>,
    /// Aggregate statistics
    pub stats: ErrorStats,
}

impl CombinationSummary {
    /// Summarize the trials of one combination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTrials`] if `trials` is empty.
    pub fn new(setting: ParameterSetting, target: f64, trials: Vec<TrialResult>) -> Result<Self> {
        let stats = summarize(target, &trials)?;
        Ok(Self {
            setting,
            target,
            trials,
            stats,
        })
    }
}

/// Where and why a sweep stopped early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAbort {
    /// 1-based combination that failed
    pub combination: usize,
    /// 1-based trial that failed, `None` if applying the settings failed
    pub trial: Option<usize>,
    /// Settings of the failed combination
    pub setting: ParameterSetting,
    /// Error message
    pub reason: String,
}

/// How a sweep ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SweepStatus {
    /// Every combination ran
    Completed,
    /// A fault stopped the sweep; earlier combinations are kept
    Aborted(SweepAbort),
}

/// Results of one sweep, in sweep order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Motion measured
    pub motion: MotionKind,
    /// Axis kinds in declaration order
    pub axes: Vec<AxisKind>,
    /// Trials per combination
    pub repeat_num: usize,
    /// Completed combinations
    pub combinations: Vec<CombinationSummary>,
    /// Completion status
    pub status: SweepStatus,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    pub ended_at: DateTime<Utc>,
}

impl ExperimentReport {
    /// Whether every combination ran.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.status, SweepStatus::Completed)
    }

    /// Abort details, if the sweep stopped early.
    #[must_use]
    pub const fn abort(&self) -> Option<&SweepAbort> {
        match &self.status {
            SweepStatus::Completed => None,
            SweepStatus::Aborted(abort) => Some(abort),
        }
    }

    /// Number of completed combinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    /// Whether no combination completed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Combination with the lowest mean absolute error (first on ties).
    #[must_use]
    pub fn best_by_mean_abs_error(&self) -> Option<&CombinationSummary> {
        self.combinations.iter().reduce(|best, candidate| {
            if candidate.stats.mean_abs_error < best.stats.mean_abs_error {
                candidate
            } else {
                best
            }
        })
    }
}

async fn countdown(pacing: SweepPacing) {
    for remaining in (1..=pacing.countdown_secs).rev() {
        info!("starting in {remaining} s");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn run_combination<E: TrialExecutor>(
    executor: &mut E,
    setting: &ParameterSetting,
    target: f64,
    repeat_num: usize,
) -> std::result::Result<CombinationSummary, (Option<usize>, Error)> {
    executor.configure(setting).await.map_err(|e| (None, e))?;

    let mut trials = Vec::with_capacity(repeat_num);
    for index in 1..=repeat_num {
        info!(trial = index, repeat_num, target, "running trial");
        let result = executor
            .run_trial(index, target)
            .await
            .map_err(|e| (Some(index), e))?;
        trials.push(result);
    }

    CombinationSummary::new(setting.clone(), target, trials).map_err(|e| (None, e))
}

/// Run every combination of `plan` through `executor`.
///
/// Combinations run in declaration order with `repeat_num` sequential
/// trials each. A fault from the executor halts it and ends the sweep; the
/// report then holds the combinations completed before the fault and
/// [`SweepStatus::Aborted`].
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if the plan fails validation. Nothing
/// moves in that case.
pub async fn run_sweep<E: TrialExecutor>(
    plan: &SweepPlan,
    executor: &mut E,
) -> Result<ExperimentReport> {
    plan.validate()?;

    if let Some(empty) = plan.axes.iter().find(|a| a.is_empty()) {
        warn!(axis = %empty.kind, "axis has no values; the sweep has nothing to run");
    }
    let settings = plan.combinations();

    let started_at = Utc::now();
    let total = settings.len();
    let mut completed = Vec::with_capacity(total);
    let mut status = SweepStatus::Completed;

    for (i, setting) in settings.into_iter().enumerate() {
        let number = i + 1;
        if i > 0 && plan.pacing.inter_combination_pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(plan.pacing.inter_combination_pause_ms))
                .await;
        }
        countdown(plan.pacing).await;

        let target = plan.target_for(&setting).ok_or_else(|| {
            Error::InvalidConfig(format!("no target for combination {setting}"))
        })?;
        info!(combination = number, total, %setting, "starting combination");

        match run_combination(executor, &setting, target, plan.repeat_num).await {
            Ok(summary) => {
                info!(
                    combination = number,
                    mean_error = summary.stats.mean_error,
                    mean_abs_error = summary.stats.mean_abs_error,
                    "combination complete"
                );
                completed.push(summary);
            }
            Err((trial, err)) => {
                match trial {
                    Some(t) => error!(
                        combination = number,
                        trial = t,
                        %setting,
                        "trial failed, aborting sweep: {err}"
                    ),
                    None => error!(
                        combination = number,
                        %setting,
                        "could not apply settings, aborting sweep: {err}"
                    ),
                }
                if let Err(stop_err) = executor.halt().await {
                    error!("fail-safe stop failed: {stop_err}");
                }
                status = SweepStatus::Aborted(SweepAbort {
                    combination: number,
                    trial,
                    setting,
                    reason: err.to_string(),
                });
                break;
            }
        }
    }

    Ok(ExperimentReport {
        motion: plan.motion,
        axes: plan.axis_kinds(),
        repeat_num: plan.repeat_num,
        combinations: completed,
        status,
        started_at,
        ended_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_zero_repeat() {
        let result = SweepPlan::builder(MotionKind::Turn)
            .axis(AxisKind::TargetAngleDeg, [30.0])
            .repeat(0)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_no_axes() {
        let result = SweepPlan::builder(MotionKind::Turn).fixed_target(90.0).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_duplicate_axis() {
        let result = SweepPlan::builder(MotionKind::Turn)
            .axis(AxisKind::MotorPowerPercent, [40.0])
            .axis(AxisKind::MotorPowerPercent, [70.0])
            .fixed_target(90.0)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_mismatched_target_axis() {
        let result = SweepPlan::builder(MotionKind::Turn)
            .axis(AxisKind::TargetDistanceMm, [100.0])
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_missing_and_double_target() {
        let missing = SweepPlan::builder(MotionKind::Straight)
            .axis(AxisKind::MotorPowerPercent, [40.0])
            .build();
        assert!(missing.is_err());

        let double = SweepPlan::builder(MotionKind::Straight)
            .axis(AxisKind::TargetDistanceMm, [100.0])
            .fixed_target(100.0)
            .build();
        assert!(double.is_err());
    }

    #[test]
    fn test_builder_rejects_nan() {
        let result = SweepPlan::builder(MotionKind::Turn)
            .axis(AxisKind::TargetAngleDeg, [f64::NAN])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_linked_length_mismatch() {
        let result = SweepPlan::builder(MotionKind::Turn)
            .push_axis(
                Axis::new(AxisKind::StraightSpeedPercent, [15.0, 30.0, 45.0])
                    .linked(AxisKind::TurnSpeedPercent, [10.0, 25.0]),
            )
            .fixed_target(90.0)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(ref m)) if m.contains("linked")));
    }

    #[test]
    fn test_builder_rejects_linked_kind_declared_twice() {
        let result = SweepPlan::builder(MotionKind::Turn)
            .push_axis(
                Axis::new(AxisKind::StraightSpeedPercent, [15.0])
                    .linked(AxisKind::TurnSpeedPercent, [10.0]),
            )
            .axis(AxisKind::TurnSpeedPercent, [30.0])
            .fixed_target(90.0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_linked_target_counts_as_target_axis() {
        let plan = SweepPlan::builder(MotionKind::Turn)
            .push_axis(
                Axis::new(AxisKind::TurnSpeedPercent, [20.0, 80.0])
                    .linked(AxisKind::TargetAngleDeg, [30.0, 90.0]),
            )
            .build()
            .unwrap();
        let settings = plan.combinations();
        assert_eq!(plan.target_for(&settings[1]), Some(90.0));

        let nan = SweepPlan::builder(MotionKind::Turn)
            .push_axis(
                Axis::new(AxisKind::TurnSpeedPercent, [20.0])
                    .linked(AxisKind::TargetAngleDeg, [f64::NAN]),
            )
            .build();
        assert!(nan.is_err());
    }

    #[test]
    fn test_target_for_prefers_fixed_target() {
        let plan = SweepPlan::builder(MotionKind::Turn)
            .axis(AxisKind::MotorPowerPercent, [10.0, 20.0])
            .fixed_target(60.0)
            .build()
            .unwrap();
        let settings = plan.combinations();
        assert_eq!(plan.target_for(&settings[1]), Some(60.0));
    }

    #[test]
    fn test_plan_deserializes() {
        let json = r#"{
            "motion": "straight",
            "axes": [
                {"kind": "motor_power_percent", "values": [40, 70]},
                {"kind": "target_distance_mm", "values": [20, 40]}
            ],
            "repeat_num": 2
        }"#;
        let plan: SweepPlan = serde_json::from_str(json).unwrap();
        plan.validate().unwrap();
        assert_eq!(plan.combinations().len(), 4);
        assert_eq!(plan.pacing, SweepPacing::default());
    }
}
