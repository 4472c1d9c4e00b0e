//! Development score formulas and absence-aware aggregation helpers.
//!
//! Every aggregate here skips absent inputs explicitly and reports `None`
//! when nothing is left to aggregate.

/// Ceiling applied to individual scores when they are averaged.
pub const SCORE_CAP: f64 = 100.0;

/// Converts a raw value into a percentage of its goal standard.
///
/// The result is not capped: values beyond the goal score above 100.
///
/// # Arguments
/// * `value` - Observed metric value, if recorded
/// * `standard` - Goal standard for the exercise, sex and metric
///
/// # Returns
/// `(value / standard) × 100`, or None when the value is absent
pub fn development_score(value: Option<f64>, standard: f64) -> Option<f64> {
    value.map(|v| v / standard * 100.0)
}

/// Arithmetic mean of the present values.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Mean of the present scores after capping each at [`SCORE_CAP`].
pub fn capped_mean<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    mean(scores.into_iter().map(|s| s.map(|v| v.min(SCORE_CAP))))
}

/// Mean of two values, defined only when both are.
pub fn mean_of_both(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        _ => None,
    }
}

/// Percentage change from `previous` to `next`.
///
/// Undefined when either side is absent or the previous value is zero.
pub fn percentage_change(previous: Option<f64>, next: Option<f64>) -> Option<f64> {
    let (previous, next) = (previous?, next?);
    if previous == 0.0 {
        return None;
    }
    Some((next - previous) / previous * 100.0)
}
