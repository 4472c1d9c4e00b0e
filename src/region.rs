//! Body-region averages, improvement thresholds and underperformers.
//!
//! Works over multi-test users only. A user's region score for a test is the
//! capped mean of their scores over the region's exercises; the overall score
//! is the mean of the power and acceleration region scores.

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::Period;
use crate::config::AnalysisConfig;
use crate::development::{Measure, UserAssessment};
use crate::domain::{BodyRegion, Exercise, Metric};
use crate::formulas::{capped_mean, mean, mean_of_both, percentage_change};

/// Per-test group average of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseRow {
    pub exercise: Exercise,
    /// Average capped score per test, from Test 1.
    pub averages: Vec<Option<f64>>,
    /// Percentage change per period.
    pub changes: Vec<Option<f64>>,
}

/// A user whose change fell below the period threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Underperformer {
    pub user: String,
    pub change: f64,
}

/// Threshold and underperformers of one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPeriod {
    pub period: Period,
    /// Mean of the users' region-score percentage changes.
    pub threshold: Option<f64>,
    /// Users with both region scores defined for the period.
    pub contributors: usize,
    pub underperformers: Vec<Underperformer>,
}

/// Region results for one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMeasure {
    pub measure: Measure,
    pub exercises: Vec<ExerciseRow>,
    /// Mean of the users' region scores per test.
    pub averages: Vec<Option<f64>>,
    pub periods: Vec<RegionPeriod>,
}

impl RegionMeasure {
    pub fn period(&self, period: Period) -> Option<&RegionPeriod> {
        self.periods.iter().find(|p| p.period == period)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAnalysis {
    pub region: BodyRegion,
    pub users: usize,
    pub measures: Vec<RegionMeasure>,
}

impl RegionAnalysis {
    pub fn measure(&self, measure: Measure) -> Option<&RegionMeasure> {
        self.measures.iter().find(|m| m.measure == measure)
    }
}

/// A user's region score for one test.
pub fn region_score(
    user: &UserAssessment,
    exercises: &[Exercise],
    slot: usize,
    measure: Measure,
) -> Option<f64> {
    let metric_score = |metric: Metric| {
        user.development(metric)
            .slots()
            .get(slot)
            .and_then(|scores| scores.capped_average_of(exercises))
    };
    match measure {
        Measure::Power => metric_score(Metric::Power),
        Measure::Acceleration => metric_score(Metric::Acceleration),
        Measure::Overall => mean_of_both(
            metric_score(Metric::Power),
            metric_score(Metric::Acceleration),
        ),
    }
}

/// Group average of one exercise at one test, over capped user scores.
fn exercise_average(
    users: &[&UserAssessment],
    exercise: Exercise,
    slot: usize,
    measure: Measure,
) -> Option<f64> {
    let for_metric = |metric: Metric| {
        capped_mean(users.iter().map(|u| u.development(metric).get(slot, exercise)))
    };
    match measure {
        Measure::Power => for_metric(Metric::Power),
        Measure::Acceleration => for_metric(Metric::Acceleration),
        Measure::Overall => mean_of_both(
            for_metric(Metric::Power),
            for_metric(Metric::Acceleration),
        ),
    }
}

fn changes(averages: &[Option<f64>]) -> Vec<Option<f64>> {
    averages
        .windows(2)
        .map(|pair| percentage_change(pair[0], pair[1]))
        .collect()
}

/// Analyzes one region across the given users.
///
/// Single-test users are ignored.
pub fn analyze_region(
    region: BodyRegion,
    users: &[UserAssessment],
    config: &AnalysisConfig,
) -> RegionAnalysis {
    let multi: Vec<&UserAssessment> = users.iter().filter(|u| u.is_multi_test()).collect();
    let max_slots = multi.iter().map(|u| u.test_count()).max().unwrap_or(0);
    let test_columns = config.test_columns(max_slots);
    let exercises = region.full_exercises();

    let measures = Measure::all()
        .iter()
        .map(|&measure| analyze_measure(&multi, &exercises, measure, test_columns))
        .collect();

    RegionAnalysis {
        region,
        users: multi.len(),
        measures,
    }
}

fn analyze_measure(
    users: &[&UserAssessment],
    exercises: &[Exercise],
    measure: Measure,
    test_columns: usize,
) -> RegionMeasure {
    let rows = exercises
        .iter()
        .map(|&exercise| {
            let averages: Vec<Option<f64>> = (0..test_columns)
                .map(|slot| exercise_average(users, exercise, slot, measure))
                .collect();
            ExerciseRow {
                exercise,
                changes: changes(&averages),
                averages,
            }
        })
        .collect();

    let averages = (0..test_columns)
        .map(|slot| mean(users.iter().map(|u| region_score(u, exercises, slot, measure))))
        .collect();

    let periods = Period::up_to(test_columns)
        .map(|period| {
            let user_changes: Vec<(&str, f64)> = users
                .iter()
                .filter_map(|u| {
                    let change = percentage_change(
                        region_score(u, exercises, period.from_slot(), measure),
                        region_score(u, exercises, period.to_slot(), measure),
                    )?;
                    Some((u.user(), change))
                })
                .collect();

            let threshold = mean(user_changes.iter().map(|(_, c)| Some(*c)));
            let underperformers = match threshold {
                Some(threshold) => user_changes
                    .iter()
                    .filter(|(_, change)| *change < threshold)
                    .map(|(user, change)| Underperformer {
                        user: user.to_string(),
                        change: *change,
                    })
                    .collect(),
                None => Vec::new(),
            };

            RegionPeriod {
                period,
                threshold,
                contributors: user_changes.len(),
                underperformers,
            }
        })
        .collect();

    RegionMeasure {
        measure,
        exercises: rows,
        averages,
        periods,
    }
}

/// Analyzes every body region, in region order.
pub fn analyze_regions(users: &[UserAssessment], config: &AnalysisConfig) -> Vec<RegionAnalysis> {
    BodyRegion::all()
        .par_iter()
        .map(|&region| analyze_region(region, users, config))
        .collect()
}
