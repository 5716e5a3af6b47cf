use serde::{Deserialize, Serialize};
use vigil_core::Direction;

/// Result of comparing today's value against its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Percent change from baseline; `+inf` when the baseline is zero and today is positive
    pub percent_change: f64,
    pub matched: bool,
}

/// Percent change from `baseline` to `today`.
///
/// A zero baseline never divides: positive `today` yields `f64::INFINITY`,
/// anything else yields `0.0`. NaN inputs count as zero.
///
/// The change is scaled by `|baseline|`, so a rise from a negative baseline is a
/// positive change: -10 to -5 is +50%, not the -50% that `today / baseline - 1` gives.
pub fn percent_change(today: f64, baseline: f64) -> f64 {
    let today = normalize(today);
    let baseline = normalize(baseline);

    if baseline == 0.0 {
        return if today > 0.0 { f64::INFINITY } else { 0.0 };
    }

    (today - baseline) * 100.0 / baseline.abs()
}

/// Classify the change against a threshold. Both directions compare strictly.
pub fn compare(today: f64, baseline: f64, direction: Direction, threshold: f64) -> Comparison {
    let percent_change = percent_change(today, baseline);
    let matched = match direction {
        Direction::Increased => percent_change > threshold,
        Direction::Decreased => percent_change < threshold,
    };

    Comparison {
        percent_change,
        matched,
    }
}

fn normalize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}
