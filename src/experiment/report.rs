//! Fixed-width table rendering for sweep reports
//!
//! Pure formatting over a finished [`ExperimentReport`]: parameter values
//! get one decimal place, error statistics two, signed means an explicit
//! `+`/`-`.

use super::sweep::{CombinationSummary, ExperimentReport};
use super::AxisKind;
use std::fmt::Write;

const SUMMARY_WIDTHS: [usize; 4] = [14, 16, 19, 12];
const ACCURACY_WIDTHS: [usize; 8] = [14, 16, 19, 12, 12, 12, 12, 19];

fn border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for &w in widths {
        line.push_str(&"-".repeat(w));
        line.push('+');
    }
    line
}

fn header(widths: &[usize], labels: &[String]) -> String {
    let mut line = String::from("|");
    for (&w, label) in widths.iter().zip(labels) {
        let _ = write!(line, " {:<inner$} |", label, inner = w - 2);
    }
    line
}

fn signed(value: f64) -> String {
    let sign = if value >= 0.0 { '+' } else { '-' };
    format!("{sign}{:.2}", value.abs())
}

const fn short_label(kind: AxisKind) -> &'static str {
    match kind {
        AxisKind::MotorPowerPercent => "power",
        AxisKind::TargetAngleDeg => "angle",
        AxisKind::TargetDistanceMm => "distance",
        AxisKind::StraightSpeedPercent => "straight",
        AxisKind::TurnSpeedPercent => "turn",
    }
}

/// Index in the setting where the last axis (the table rows) begins.
fn row_start(report: &ExperimentReport, summary: &CombinationSummary) -> usize {
    let values = summary.setting.values();
    report
        .axes
        .last()
        .and_then(|&row| values.iter().position(|&(kind, _)| kind == row))
        .unwrap_or_else(|| values.len().saturating_sub(1))
}

fn row_value(report: &ExperimentReport, summary: &CombinationSummary) -> f64 {
    summary
        .setting
        .values()
        .get(row_start(report, summary))
        .map_or(summary.target, |&(_, v)| v)
}

/// Outer-axis `(kind, value)` pairs that identify a table.
fn group_key<'r>(
    report: &ExperimentReport,
    summary: &'r CombinationSummary,
) -> &'r [(AxisKind, f64)] {
    &summary.setting.values()[..row_start(report, summary)]
}

fn group_title(key: &[(AxisKind, f64)]) -> String {
    key.iter()
        .map(|(kind, value)| format!("{kind}: {value:.1}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Consecutive runs of combinations sharing every axis but the last.
fn groups(report: &ExperimentReport) -> Vec<(String, &[CombinationSummary])> {
    let rows = &report.combinations;
    let mut out: Vec<(String, &[CombinationSummary])> = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        let boundary =
            i == rows.len() || group_key(report, &rows[i]) != group_key(report, &rows[start]);
        if boundary {
            out.push((group_title(group_key(report, &rows[start])), &rows[start..i]));
            start = i;
        }
    }
    out
}

fn title(report: &ExperimentReport, group: &str) -> String {
    let row_axis = report.axes.last().map_or("target", |k| k.name());
    if group.is_empty() {
        format!("=== {:?} error by {row_axis} ===", report.motion)
    } else {
        format!("=== {group} ===")
    }
}

fn row_label(report: &ExperimentReport) -> String {
    report.axes.last().map_or_else(
        || format!("target[{}]", report.motion.unit()),
        |&k| format!("{}[{}]", short_label(k), k.unit()),
    )
}

fn push_abort(out: &mut String, report: &ExperimentReport) {
    if let Some(abort) = report.abort() {
        let at = abort.trial.map_or_else(
            || "while applying settings".to_string(),
            |t| format!("trial {t}"),
        );
        let _ = writeln!(
            out,
            "ABORTED at combination {}, {at} ({}): {}",
            abort.combination, abort.setting, abort.reason
        );
    }
}

/// Render one bordered table per group of the last axis.
///
/// Columns: parameter value, signed mean error, mean absolute error, trial count.
/// Groups split wherever an outer-axis value changes, however small the change.
#[must_use]
pub fn render(report: &ExperimentReport) -> String {
    let unit = report.motion.unit();
    let labels = [
        row_label(report),
        format!("mean err[{unit}]"),
        format!("mean |err|[{unit}]"),
        "trials".to_string(),
    ];
    let rule = border(&SUMMARY_WIDTHS);

    let mut out = String::new();
    if report.is_empty() {
        let _ = writeln!(out, "{}", title(report, ""));
        let _ = writeln!(out, "(no completed combinations)");
    }
    for (group, rows) in groups(report) {
        let _ = writeln!(out, "{}", title(report, &group));
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", header(&SUMMARY_WIDTHS, &labels));
        let _ = writeln!(out, "{rule}");
        for summary in rows {
            let stats = &summary.stats;
            let _ = writeln!(
                out,
                "| {:>12.1} | {:>14} | {:>17.2} | {:>10} |",
                row_value(report, summary),
                signed(stats.mean_error),
                stats.mean_abs_error,
                stats.count
            );
        }
        let _ = writeln!(out, "{rule}");
    }
    push_abort(&mut out, report);
    out
}

/// Render the extended accuracy table: min, max, range, accuracy and grade.
#[must_use]
pub fn render_accuracy(report: &ExperimentReport) -> String {
    let unit = report.motion.unit();
    let labels = [
        row_label(report),
        format!("mean err[{unit}]"),
        format!("mean |err|[{unit}]"),
        format!("min[{unit}]"),
        format!("max[{unit}]"),
        format!("range[{unit}]"),
        "accuracy".to_string(),
        "grade".to_string(),
    ];
    let rule = border(&ACCURACY_WIDTHS);

    let mut out = String::new();
    for (group, rows) in groups(report) {
        let _ = writeln!(out, "{}", title(report, &group));
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", header(&ACCURACY_WIDTHS, &labels));
        let _ = writeln!(out, "{rule}");
        for summary in rows {
            let stats = &summary.stats;
            let grade = stats
                .accuracy
                .grade()
                .map_or_else(|| "-".to_string(), |g| g.to_string());
            let _ = writeln!(
                out,
                "| {:>12.1} | {:>14} | {:>17.2} | {:>10} | {:>10} | {:>10.2} | {:>10} | {:<17} |",
                row_value(report, summary),
                signed(stats.mean_error),
                stats.mean_abs_error,
                signed(stats.min_error),
                signed(stats.max_error),
                stats.spread(),
                stats.accuracy.to_string(),
                grade
            );
        }
        let _ = writeln!(out, "{rule}");
    }
    push_abort(&mut out, report);
    out
}

/// One line naming the setting with the lowest mean absolute error.
#[must_use]
pub fn render_best(report: &ExperimentReport) -> String {
    report.best_by_mean_abs_error().map_or_else(
        || "best setting: none (no completed combinations)".to_string(),
        |best| {
            format!(
                "best setting: {} (mean |err| {:.2} {}, mean err {}, accuracy {})",
                best.setting,
                best.stats.mean_abs_error,
                report.motion.unit(),
                signed(best.stats.mean_error),
                best.stats.accuracy
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_prefix() {
        assert_eq!(signed(0.6666), "+0.67");
        assert_eq!(signed(-1.234), "-1.23");
        assert_eq!(signed(0.0), "+0.00");
    }

    #[test]
    fn test_border_and_header_widths_match() {
        let rule = border(&SUMMARY_WIDTHS);
        let labels = [
            "power[%]".to_string(),
            "mean err[deg]".to_string(),
            "mean |err|[deg]".to_string(),
            "trials".to_string(),
        ];
        assert_eq!(rule.len(), header(&SUMMARY_WIDTHS, &labels).len());
        assert_eq!(
            rule,
            "+--------------+----------------+-------------------+------------+"
        );
    }
}
