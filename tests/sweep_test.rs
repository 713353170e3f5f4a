//! Sweep controller scenarios with a scripted trial executor
//!
//! The stub never touches a drive base: it returns `target + error` from a
//! fixed error script and can be told to fail at a given trial.

use drive_sweep::drive::{DriveBase, SimDriveBase, WheelSide};
use drive_sweep::experiment::{
    render, render_accuracy, run_sweep, Accuracy, Axis, AxisKind, DriveTrialExecutor, MotionKind,
    ParameterSetting, SweepPacing, SweepPlan, SweepStatus, TrialExecutor, TrialProcedure, TrialResult,
};
use drive_sweep::{Error, Result};

#[derive(Debug, Default)]
struct ScriptedExecutor {
    errors: Vec<f64>,
    fail_at: Option<(usize, usize)>,
    fail_configure_at: Option<usize>,
    configured: Vec<ParameterSetting>,
    trials_run: usize,
    halts: usize,
}

impl ScriptedExecutor {
    fn with_errors(errors: &[f64]) -> Self {
        Self {
            errors: errors.to_vec(),
            ..Self::default()
        }
    }
}

impl TrialExecutor for ScriptedExecutor {
    async fn configure(&mut self, setting: &ParameterSetting) -> Result<()> {
        self.configured.push(setting.clone());
        if self.fail_configure_at == Some(self.configured.len()) {
            return Err(Error::Hardware("power limit rejected".to_string()));
        }
        Ok(())
    }

    async fn run_trial(&mut self, index: usize, target: f64) -> Result<TrialResult> {
        if self.fail_at == Some((self.configured.len(), index)) {
            return Err(Error::Hardware("IMU read timed out".to_string()));
        }
        self.trials_run += 1;
        let error = self.errors[(index - 1) % self.errors.len()];
        Ok(TrialResult::new(index, target, target + error))
    }

    async fn halt(&mut self) -> Result<()> {
        self.halts += 1;
        Ok(())
    }
}

fn power_plan() -> SweepPlan {
    SweepPlan::builder(MotionKind::Turn)
        .axis(AxisKind::MotorPowerPercent, [40.0, 70.0, 100.0])
        .fixed_target(60.0)
        .repeat(3)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_deterministic_errors_give_same_stats_for_every_power() {
    let mut stub = ScriptedExecutor::with_errors(&[1.0, -1.0, 2.0]);
    let report = run_sweep(&power_plan(), &mut stub).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.len(), 3);
    for summary in &report.combinations {
        assert_eq!(summary.stats.count, 3);
        assert!((summary.stats.mean_error - 0.667).abs() < 1e-3);
        assert!((summary.stats.mean_abs_error - 1.333).abs() < 1e-3);
    }

    let table = render(&report);
    assert_eq!(table.matches("+0.67").count(), 3);
    assert_eq!(table.matches("1.33").count(), 3);
    assert_eq!(stub.halts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_exact_trials_report_zero_error_and_full_accuracy() {
    let plan = SweepPlan::builder(MotionKind::Turn)
        .axis(AxisKind::TargetAngleDeg, [30.0, 60.0, 90.0])
        .repeat(2)
        .build()
        .unwrap();
    let mut stub = ScriptedExecutor::with_errors(&[0.0]);
    let report = run_sweep(&plan, &mut stub).await.unwrap();

    assert_eq!(report.len(), 3);
    for (summary, target) in report.combinations.iter().zip([30.0, 60.0, 90.0]) {
        assert!((summary.target - target).abs() < f64::EPSILON);
        assert!(summary.stats.mean_error.abs() < f64::EPSILON);
        assert!(summary.stats.mean_abs_error.abs() < f64::EPSILON);
        assert_eq!(summary.stats.accuracy, Accuracy::Percent(100.0));
    }

    let table = render(&report);
    assert_eq!(table.matches("+0.00").count(), 3);
    assert!(render_accuracy(&report).contains("100.0%"));
}

#[tokio::test(start_paused = true)]
async fn test_fault_on_second_trial_of_second_combination_aborts() {
    let mut stub = ScriptedExecutor::with_errors(&[1.0, -1.0, 2.0]);
    stub.fail_at = Some((2, 2));
    let report = run_sweep(&power_plan(), &mut stub).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(
        report.combinations[0].setting.get(AxisKind::MotorPowerPercent),
        Some(40.0)
    );
    let abort = report.abort().unwrap();
    assert_eq!(abort.combination, 2);
    assert_eq!(abort.trial, Some(2));
    assert!(abort.reason.contains("IMU read timed out"));

    // Third combination never configured; actuator halted once
    assert_eq!(stub.configured.len(), 2);
    assert_eq!(stub.trials_run, 4);
    assert_eq!(stub.halts, 1);
    assert!(render(&report).contains("ABORTED at combination 2, trial 2"));
}

#[tokio::test(start_paused = true)]
async fn test_configure_failure_aborts_without_trials() {
    let mut stub = ScriptedExecutor::with_errors(&[0.5]);
    stub.fail_configure_at = Some(1);
    let report = run_sweep(&power_plan(), &mut stub).await.unwrap();

    assert!(report.is_empty());
    assert!(matches!(
        report.status,
        SweepStatus::Aborted(ref a) if a.trial.is_none() && a.combination == 1
    ));
    assert_eq!(stub.trials_run, 0);
    assert_eq!(stub.halts, 1);
    assert!(render(&report).contains("while applying settings"));
}

#[tokio::test(start_paused = true)]
async fn test_trials_keep_execution_order() {
    let mut stub = ScriptedExecutor::with_errors(&[3.0, -2.0, 1.0]);
    let report = run_sweep(&power_plan(), &mut stub).await.unwrap();

    let trials = &report.combinations[0].trials;
    let indices: Vec<usize> = trials.iter().map(|t| t.index).collect();
    let errors: Vec<f64> = trials.iter().map(|t| t.signed_error).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(errors, vec![3.0, -2.0, 1.0]);
}

#[tokio::test(start_paused = true)]
async fn test_combinations_run_in_declaration_order() {
    let plan = SweepPlan::builder(MotionKind::Straight)
        .axis(AxisKind::MotorPowerPercent, [40.0, 70.0])
        .axis(AxisKind::TargetDistanceMm, [20.0, 40.0, 60.0])
        .repeat(1)
        .build()
        .unwrap();
    let mut stub = ScriptedExecutor::with_errors(&[0.0]);
    run_sweep(&plan, &mut stub).await.unwrap();

    let order: Vec<(f64, f64)> = stub
        .configured
        .iter()
        .map(|s| {
            (
                s.get(AxisKind::MotorPowerPercent).unwrap(),
                s.get(AxisKind::TargetDistanceMm).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            (40.0, 20.0),
            (40.0, 40.0),
            (40.0, 60.0),
            (70.0, 20.0),
            (70.0, 40.0),
            (70.0, 60.0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_axis_gives_empty_completed_report() {
    let plan = SweepPlan::builder(MotionKind::Turn)
        .axis(AxisKind::MotorPowerPercent, Vec::<f64>::new())
        .fixed_target(90.0)
        .build()
        .unwrap();
    let mut stub = ScriptedExecutor::with_errors(&[1.0]);
    let report = run_sweep(&plan, &mut stub).await.unwrap();

    assert!(report.is_empty());
    assert!(report.is_complete());
    assert!(stub.configured.is_empty());
    assert!(render(&report).contains("(no completed combinations)"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_plan_fails_before_any_motion() {
    let robot = SimDriveBase::default();
    let plan = SweepPlan {
        motion: MotionKind::Turn,
        axes: vec![Axis::new(AxisKind::MotorPowerPercent, [50.0])],
        repeat_num: 0,
        fixed_target: Some(90.0),
        pacing: SweepPacing::default(),
    };
    let mut executor =
        DriveTrialExecutor::new(&robot, MotionKind::Turn).with_procedure(TrialProcedure::immediate());

    let err = run_sweep(&plan, &mut executor).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert_eq!(robot.motion_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sim_fault_aborts_and_stops_drive_base() {
    let robot = SimDriveBase::default();
    // 3 trials per combination: motion 5 is the 2nd trial of the 2nd combination
    robot.fail_on_motion(5);
    let mut executor =
        DriveTrialExecutor::new(&robot, MotionKind::Turn).with_procedure(TrialProcedure::immediate());

    let report = run_sweep(&power_plan(), &mut executor).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.abort().unwrap().trial, Some(2));
    // Four completed trials stop once each, then the halt
    assert_eq!(robot.motion_count(), 5);
    assert_eq!(robot.stop_count(), 5);
}

/// Simulated drive base whose heading sensor reads NaN from the `n`-th read on.
struct NanImu {
    inner: SimDriveBase,
    reads: std::cell::Cell<u32>,
    nan_from: u32,
}

impl NanImu {
    fn new(nan_from: u32) -> Self {
        Self {
            inner: SimDriveBase::default(),
            reads: std::cell::Cell::new(0),
            nan_from,
        }
    }
}

impl DriveBase for NanImu {
    async fn straight(&self, distance_mm: f64) -> Result<()> {
        self.inner.straight(distance_mm).await
    }

    async fn turn(&self, angle_deg: f64) -> Result<()> {
        self.inner.turn(angle_deg).await
    }

    async fn stop(&self) -> Result<()> {
        self.inner.stop().await
    }

    fn brake(&self) -> Result<()> {
        self.inner.brake()
    }

    fn set_speeds(&self, straight_mm_per_s: f64, turn_deg_per_s: f64) -> Result<()> {
        self.inner.set_speeds(straight_mm_per_s, turn_deg_per_s)
    }

    fn set_power_limit(&self, percent: f64) -> Result<()> {
        self.inner.set_power_limit(percent)
    }

    fn heading(&self) -> Result<f64> {
        let n = self.reads.get() + 1;
        self.reads.set(n);
        if n >= self.nan_from {
            Ok(f64::NAN)
        } else {
            self.inner.heading()
        }
    }

    fn reset_heading(&self, value: f64) -> Result<()> {
        self.inner.reset_heading(value)
    }

    fn distance(&self) -> Result<f64> {
        self.inner.distance()
    }

    fn reset_distance(&self) -> Result<()> {
        self.inner.reset_distance()
    }

    fn wheel_angle(&self, side: WheelSide) -> Result<f64> {
        self.inner.wheel_angle(side)
    }
}

#[tokio::test(start_paused = true)]
async fn test_nan_heading_aborts_instead_of_recording_a_trial() {
    let robot = NanImu::new(2);
    let plan = SweepPlan::builder(MotionKind::Turn)
        .axis(AxisKind::TargetAngleDeg, [90.0])
        .repeat(2)
        .build()
        .unwrap();
    let mut executor =
        DriveTrialExecutor::new(&robot, MotionKind::Turn).with_procedure(TrialProcedure::immediate());

    let report = run_sweep(&plan, &mut executor).await.unwrap();

    assert!(!report.is_complete());
    assert!(report.is_empty());
    let abort = report.abort().unwrap();
    assert_eq!(abort.combination, 1);
    assert_eq!(abort.trial, Some(2));
    assert!(abort.reason.contains("NaN"));
    // First trial stops normally, then the halt
    assert_eq!(robot.inner.stop_count(), 2);
    assert!(!render_accuracy(&report).contains("NaN"));
}

#[tokio::test(start_paused = true)]
async fn test_nan_heading_from_first_trial_is_a_hardware_fault() {
    let robot = NanImu::new(1);
    let mut executor =
        DriveTrialExecutor::new(&robot, MotionKind::Turn).with_procedure(TrialProcedure::immediate());

    let err = executor.run_trial(1, 90.0).await.unwrap_err();
    assert!(err.is_hardware());
}
