//! Row-level pre-filters applied before test-instance assembly.
//!
//! Filters only remove observations and never reorder them, so assembly over
//! filtered input stays deterministic.

use log::info;

use crate::config::DateRange;
use crate::domain::Observation;
use crate::standards::StandardResistances;

/// Keeps observations whose calendar date lies inside the range.
pub fn filter_date_range(observations: &mut Vec<Observation>, range: &DateRange) {
    let before = observations.len();
    observations.retain(|obs| range.contains(obs.timestamp.date()));
    info!(
        "Date range {} to {} kept {} of {} observations",
        range.start,
        range.end,
        observations.len(),
        before
    );
}

/// Keeps observations performed at their exercise's standard resistance.
///
/// Observations without a recorded resistance are removed.
pub fn filter_standard_resistance(
    observations: &mut Vec<Observation>,
    resistances: &StandardResistances,
) {
    let before = observations.len();
    observations.retain(|obs| {
        obs.resistance
            .is_some_and(|r| resistances.is_standard(obs.exercise.base(), r))
    });
    info!(
        "Resistance standardization kept {} of {} observations",
        observations.len(),
        before
    );
}
