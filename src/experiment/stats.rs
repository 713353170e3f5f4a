//! Statistics over repeated trials
//!
//! Pure reductions: no I/O, no hidden state. The same trials always give
//! the same summary, and permuting them leaves the means unchanged.

use super::TrialResult;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy relative to the commanded target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Accuracy {
    /// `max(0, 100 - mean_abs_error / |target| * 100)`, always within `[0, 100]`
    Percent(f64),
    /// Target was zero or an input was not finite, so a relative accuracy
    /// is undefined
    NotApplicable,
}

impl Accuracy {
    /// Accuracy of `mean_abs_error` against `target`.
    #[must_use]
    pub fn from_error(mean_abs_error: f64, target: f64) -> Self {
        if target == 0.0 || !target.is_finite() || !mean_abs_error.is_finite() {
            return Self::NotApplicable;
        }
        let percent = 100.0 - mean_abs_error / target.abs() * 100.0;
        Self::Percent(percent.clamp(0.0, 100.0))
    }

    /// Percentage, if applicable.
    #[must_use]
    pub const fn percent(self) -> Option<f64> {
        match self {
            Self::Percent(p) => Some(p),
            Self::NotApplicable => None,
        }
    }

    /// Rating band for this accuracy.
    #[must_use]
    pub fn grade(self) -> Option<AccuracyGrade> {
        self.percent().map(AccuracyGrade::from_percent)
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{p:.1}%"),
            Self::NotApplicable => f.write_str("n/a"),
        }
    }
}

/// Rating band used when reviewing turn accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccuracyGrade {
    /// Below 80%
    NeedsImprovement,
    /// 80% to 90%
    Fair,
    /// 90% to 95%
    Good,
    /// 95% and above
    Excellent,
}

impl AccuracyGrade {
    /// Band for an accuracy percentage.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 95.0 {
            Self::Excellent
        } else if percent >= 90.0 {
            Self::Good
        } else if percent >= 80.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    /// Short label for tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsImprovement => "needs improvement",
        }
    }
}

impl fmt::Display for AccuracyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate error statistics for one combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Number of trials summarized
    pub count: usize,
    /// Mean signed error (`observed - target`)
    pub mean_error: f64,
    /// Mean absolute error
    pub mean_abs_error: f64,
    /// Smallest signed error
    pub min_error: f64,
    /// Largest signed error
    pub max_error: f64,
    /// Relative accuracy against the target
    pub accuracy: Accuracy,
}

impl ErrorStats {
    /// Difference between the largest and smallest signed error.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.max_error - self.min_error
    }
}

/// Reduce trials run against `target` to summary statistics.
///
/// # Errors
///
/// Returns [`Error::NoTrials`] if `results` is empty.
pub fn summarize(target: f64, results: &[TrialResult]) -> Result<ErrorStats> {
    if results.is_empty() {
        return Err(Error::NoTrials);
    }

    #[allow(clippy::cast_precision_loss)]
    let count = results.len() as f64;
    let mut sum = 0.0;
    let mut abs_sum = 0.0;
    let mut min_error = f64::INFINITY;
    let mut max_error = f64::NEG_INFINITY;
    for result in results {
        sum += result.signed_error;
        abs_sum += result.abs_error;
        min_error = min_error.min(result.signed_error);
        max_error = max_error.max(result.signed_error);
    }

    let mean_abs_error = abs_sum / count;
    Ok(ErrorStats {
        count: results.len(),
        mean_error: sum / count,
        mean_abs_error,
        min_error,
        max_error,
        accuracy: Accuracy::from_error(mean_abs_error, target),
    })
}
