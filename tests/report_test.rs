//! Table rendering over hand-built reports

use chrono::Utc;
use drive_sweep::experiment::{
    render, render_accuracy, render_best, AxisKind, CombinationSummary, ExperimentReport,
    MotionKind, ParameterSetting, SweepAbort, SweepStatus, TrialResult,
};

fn summary(setting: &[(AxisKind, f64)], target: f64, errors: &[f64]) -> CombinationSummary {
    let trials = errors
        .iter()
        .enumerate()
        .map(|(i, e)| TrialResult::new(i + 1, target, target + e))
        .collect();
    CombinationSummary::new(ParameterSetting::new(setting.to_vec()), target, trials).unwrap()
}

fn report(
    motion: MotionKind,
    axes: Vec<AxisKind>,
    combinations: Vec<CombinationSummary>,
    status: SweepStatus,
) -> ExperimentReport {
    let now = Utc::now();
    ExperimentReport {
        motion,
        axes,
        repeat_num: 3,
        combinations,
        status,
        started_at: now,
        ended_at: now,
    }
}

#[test]
fn test_single_axis_table_layout() {
    let combos = vec![
        summary(&[(AxisKind::MotorPowerPercent, 40.0)], 60.0, &[1.0, -1.0, 2.0]),
        summary(&[(AxisKind::MotorPowerPercent, 100.0)], 60.0, &[-3.0, -3.0, -3.0]),
    ];
    let text = render(&report(
        MotionKind::Turn,
        vec![AxisKind::MotorPowerPercent],
        combos,
        SweepStatus::Completed,
    ));
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "=== Turn error by motor_power_percent ===");
    assert_eq!(
        lines[1],
        "+--------------+----------------+-------------------+------------+"
    );
    assert!(lines[2].starts_with("| power[%]"));
    assert_eq!(
        lines[4],
        "|         40.0 |          +0.67 |              1.33 |          3 |"
    );
    assert_eq!(
        lines[5],
        "|        100.0 |          -3.00 |              3.00 |          3 |"
    );
    assert_eq!(lines.len(), 7);
}

#[test]
fn test_two_axis_report_groups_by_outer_axis() {
    let combos = vec![
        summary(
            &[(AxisKind::MotorPowerPercent, 40.0), (AxisKind::TargetDistanceMm, 20.0)],
            20.0,
            &[0.5],
        ),
        summary(
            &[(AxisKind::MotorPowerPercent, 40.0), (AxisKind::TargetDistanceMm, 40.0)],
            40.0,
            &[0.5],
        ),
        summary(
            &[(AxisKind::MotorPowerPercent, 70.0), (AxisKind::TargetDistanceMm, 20.0)],
            20.0,
            &[-0.5],
        ),
    ];
    let text = render(&report(
        MotionKind::Straight,
        vec![AxisKind::MotorPowerPercent, AxisKind::TargetDistanceMm],
        combos,
        SweepStatus::Completed,
    ));

    assert!(text.contains("=== motor_power_percent: 40.0 ==="));
    assert!(text.contains("=== motor_power_percent: 70.0 ==="));
    assert!(text.contains("| distance[mm]"));
    assert_eq!(text.matches("mean err[mm]").count(), 2);
}

#[test]
fn test_aborted_report_names_the_fault() {
    let combos = vec![summary(
        &[(AxisKind::MotorPowerPercent, 40.0)],
        60.0,
        &[1.0, 1.0, 1.0],
    )];
    let abort = SweepAbort {
        combination: 2,
        trial: Some(2),
        setting: ParameterSetting::new(vec![(AxisKind::MotorPowerPercent, 70.0)]),
        reason: "Hardware fault: IMU read timed out".to_string(),
    };
    let text = render(&report(
        MotionKind::Turn,
        vec![AxisKind::MotorPowerPercent],
        combos,
        SweepStatus::Aborted(abort),
    ));

    assert!(text.contains(
        "ABORTED at combination 2, trial 2 (motor_power_percent=70.0): Hardware fault: IMU read timed out"
    ));
}

#[test]
fn test_accuracy_table_grades_rows() {
    let combos = vec![
        summary(&[(AxisKind::TargetAngleDeg, 90.0)], 90.0, &[1.0, -1.0]),
        summary(&[(AxisKind::TargetAngleDeg, 10.0)], 10.0, &[3.0, 3.0]),
    ];
    let text = render_accuracy(&report(
        MotionKind::Turn,
        vec![AxisKind::TargetAngleDeg],
        combos,
        SweepStatus::Completed,
    ));

    assert!(text.contains("98.9%"));
    assert!(text.contains("excellent"));
    assert!(text.contains("70.0%"));
    assert!(text.contains("needs improvement"));
    assert!(text.contains("range[deg]"));
}

#[test]
fn test_best_setting_line() {
    let combos = vec![
        summary(&[(AxisKind::MotorPowerPercent, 40.0)], 60.0, &[2.0]),
        summary(&[(AxisKind::MotorPowerPercent, 70.0)], 60.0, &[0.5]),
        summary(&[(AxisKind::MotorPowerPercent, 100.0)], 60.0, &[-0.5]),
    ];
    let r = report(
        MotionKind::Turn,
        vec![AxisKind::MotorPowerPercent],
        combos,
        SweepStatus::Completed,
    );

    // Ties keep the first combination
    assert_eq!(
        render_best(&r),
        "best setting: motor_power_percent=70.0 (mean |err| 0.50 deg, mean err +0.50, accuracy 99.2%)"
    );
}

#[test]
fn test_empty_report_renders_placeholder() {
    let r = report(
        MotionKind::Straight,
        vec![AxisKind::TargetDistanceMm],
        Vec::new(),
        SweepStatus::Completed,
    );
    assert!(render(&r).contains("(no completed combinations)"));
    assert_eq!(render_best(&r), "best setting: none (no completed combinations)");
}

#[test]
fn test_close_outer_values_get_separate_tables() {
    let combos = vec![
        summary(
            &[(AxisKind::MotorPowerPercent, 40.01), (AxisKind::TargetAngleDeg, 90.0)],
            90.0,
            &[1.0],
        ),
        summary(
            &[(AxisKind::MotorPowerPercent, 40.04), (AxisKind::TargetAngleDeg, 90.0)],
            90.0,
            &[-1.0],
        ),
    ];
    let text = render(&report(
        MotionKind::Turn,
        vec![AxisKind::MotorPowerPercent, AxisKind::TargetAngleDeg],
        combos,
        SweepStatus::Completed,
    ));

    // Both titles print as 40.0 but the rows must not share a table
    assert_eq!(text.matches("=== motor_power_percent: 40.0 ===").count(), 2);
    assert_eq!(text.matches("|         90.0 |").count(), 2);
    assert_eq!(
        text.matches("+--------------+----------------+-------------------+------------+")
            .count(),
        6
    );
}

#[test]
fn test_linked_outer_axis_titles_show_every_pair() {
    let combos = vec![
        summary(
            &[
                (AxisKind::StraightSpeedPercent, 15.0),
                (AxisKind::TurnSpeedPercent, 10.0),
                (AxisKind::MotorPowerPercent, 50.0),
            ],
            90.0,
            &[0.5],
        ),
        summary(
            &[
                (AxisKind::StraightSpeedPercent, 15.0),
                (AxisKind::TurnSpeedPercent, 10.0),
                (AxisKind::MotorPowerPercent, 100.0),
            ],
            90.0,
            &[1.5],
        ),
        summary(
            &[
                (AxisKind::StraightSpeedPercent, 30.0),
                (AxisKind::TurnSpeedPercent, 25.0),
                (AxisKind::MotorPowerPercent, 50.0),
            ],
            90.0,
            &[2.5],
        ),
    ];
    let text = render(&report(
        MotionKind::Turn,
        vec![AxisKind::StraightSpeedPercent, AxisKind::MotorPowerPercent],
        combos,
        SweepStatus::Completed,
    ));

    assert!(text.contains("=== straight_speed_percent: 15.0, turn_speed_percent: 10.0 ==="));
    assert!(text.contains("=== straight_speed_percent: 30.0, turn_speed_percent: 25.0 ==="));
    assert!(text.contains("|         50.0 |          +0.50 |"));
    assert!(text.contains("|        100.0 |          +1.50 |"));
}

#[test]
fn test_linked_row_axis_shows_its_own_value() {
    let combos = vec![summary(
        &[
            (AxisKind::MotorPowerPercent, 70.0),
            (AxisKind::TurnSpeedPercent, 40.0),
            (AxisKind::TargetAngleDeg, 60.0),
        ],
        60.0,
        &[1.0],
    )];
    let text = render(&report(
        MotionKind::Turn,
        vec![AxisKind::MotorPowerPercent, AxisKind::TurnSpeedPercent],
        combos,
        SweepStatus::Completed,
    ));

    assert!(text.contains("=== motor_power_percent: 70.0 ==="));
    assert!(text.contains("| turn[%]"));
    assert!(text.contains("|         40.0 |          +1.00 |"));
}
