//! Analysis configuration chosen by the caller.

use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive calendar date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, swapping the bounds if they are reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Settings for one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisConfig {
    /// Minimum whole days between two accepted tests of the same exercise
    /// (0 disables the constraint).
    pub min_days_between_tests: u32,
    /// Highest test number considered by group and region statistics
    /// (None considers every test).
    pub max_tests: Option<usize>,
    /// Keep only executions at the standard resistance (± tolerance).
    pub standardize_resistance: bool,
    /// Keep only executions within this window.
    pub date_range: Option<DateRange>,
}

impl AnalysisConfig {
    /// Number of test columns to report given the largest slot count seen.
    pub fn test_columns(&self, max_slots: usize) -> usize {
        match self.max_tests {
            Some(limit) => max_slots.min(limit),
            None => max_slots,
        }
    }
}
