//! End-to-end analysis of one uploaded dataset.

use std::collections::HashMap;

use log::info;
use serde::Serialize;

use crate::analysis::{GroupAnalysis, TestSpacing, analyze_group};
use crate::assembler::{AssemblyMode, TestInstanceAssembler};
use crate::config::AnalysisConfig;
use crate::development::{UserAssessment, assess_all};
use crate::domain::{Exercise, Observation};
use crate::error::{AnalysisError, ValidationError};
use crate::normalize::{RawTable, columns, normalize};
use crate::prefilter::{filter_date_range, filter_standard_resistance};
use crate::region::{RegionAnalysis, analyze_regions};
use crate::standards::ReferenceTables;

/// Number of resistance values listed per exercise.
const TOP_RESISTANCES: usize = 3;

/// Usage of one exercise across the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseActivity {
    pub exercise: Exercise,
    pub executions: usize,
    /// Most common resistances with their counts.
    pub top_resistances: Vec<(f64, usize)>,
}

/// Dataset-level counts, taken before pre-filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub observations: usize,
    pub users: usize,
    /// Users with at least one assembled test after filtering.
    pub users_with_tests: usize,
    pub most_active_user: Option<(String, usize)>,
    pub exercises: Vec<ExerciseActivity>,
}

impl ActivitySummary {
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut per_user: HashMap<&str, usize> = HashMap::new();
        let mut executions = [0usize; Exercise::COUNT];
        let mut resistances: Vec<Vec<(f64, usize)>> = vec![Vec::new(); Exercise::COUNT];

        for obs in observations {
            *per_user.entry(obs.user.as_str()).or_default() += 1;
            let idx = obs.exercise.index();
            executions[idx] += 1;
            if let Some(r) = obs.resistance {
                let counts = &mut resistances[idx];
                let seen = counts.iter().position(|(value, _)| *value == r);
                match seen {
                    Some(i) => counts[i].1 += 1,
                    None => counts.push((r, 1)),
                }
            }
        }

        let most_active_user = per_user
            .iter()
            .max_by(|(a_user, a_count), (b_user, b_count)| {
                a_count.cmp(b_count).then_with(|| b_user.cmp(a_user))
            })
            .map(|(user, count)| (user.to_string(), *count));

        let exercises = Exercise::all()
            .map(|exercise| {
                let mut top = std::mem::take(&mut resistances[exercise.index()]);
                top.sort_by(|(a, a_count), (b, b_count)| {
                    b_count.cmp(a_count).then_with(|| a.total_cmp(b))
                });
                top.truncate(TOP_RESISTANCES);
                ExerciseActivity {
                    exercise,
                    executions: executions[exercise.index()],
                    top_resistances: top,
                }
            })
            .collect();

        Self {
            observations: observations.len(),
            users: per_user.len(),
            users_with_tests: 0,
            most_active_user,
            exercises,
        }
    }
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    /// Taxonomy order used by every per-exercise table.
    pub exercises: Vec<Exercise>,
    pub activity: ActivitySummary,
    pub users: Vec<UserAssessment>,
    pub group: GroupAnalysis,
    pub regions: Vec<RegionAnalysis>,
}

impl AnalysisReport {
    pub fn user(&self, name: &str) -> Option<&UserAssessment> {
        self.users.iter().find(|u| u.user() == name)
    }
}

/// Runs validation, pre-filtering, assembly, scoring and group/region analysis.
///
/// # Errors
/// Returns a ValidationError for malformed input (including enabling
/// resistance standardization without a resistance column) and a LookupError
/// if a reference table lacks an entry for a recorded exercise.
pub fn run(
    table: &RawTable,
    config: &AnalysisConfig,
    reference: &ReferenceTables,
) -> Result<AnalysisReport, AnalysisError> {
    if config.standardize_resistance && table.column(columns::RESISTANCE).is_none() {
        return Err(ValidationError::MissingColumns(vec![columns::RESISTANCE.to_string()]).into());
    }

    let mut observations = normalize(table)?;
    let mut activity = ActivitySummary::from_observations(&observations);

    if let Some(range) = &config.date_range {
        filter_date_range(&mut observations, range);
    }
    if config.standardize_resistance {
        filter_standard_resistance(&mut observations, &reference.resistances);
    }

    let unconstrained = TestInstanceAssembler::new(AssemblyMode::Unconstrained).assemble(&observations);
    let mode = AssemblyMode::from_min_days(config.min_days_between_tests);
    let (matrices, spacing) = match mode {
        AssemblyMode::Unconstrained => {
            let spacing =
                TestSpacing::measure(unconstrained.values(), Some(unconstrained.values()), 0);
            (unconstrained, spacing)
        }
        AssemblyMode::MinimumDays(min_days) => {
            let constrained = TestInstanceAssembler::new(mode).assemble(&observations);
            let spacing =
                TestSpacing::measure(unconstrained.values(), Some(constrained.values()), min_days);
            (constrained, spacing)
        }
    };
    info!(
        "Assembled test instances for {} users ({:?})",
        matrices.len(),
        mode
    );
    activity.users_with_tests = matrices.len();

    let users = assess_all(&matrices, &reference.standards)?;
    let group = analyze_group(&users, config, spacing);
    let regions = analyze_regions(&users, config);
    info!(
        "{} multi-test users, {} single-test users",
        group.multi_test_users.len(),
        group.single_test.users.len()
    );

    Ok(AnalysisReport {
        config: config.clone(),
        exercises: Exercise::all().collect(),
        activity,
        users,
        group,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::Bracket;
    use crate::development::Measure;
    use crate::domain::Metric;
    use crate::error::LookupError;
    use crate::standards::GoalStandards;

    const HEADERS: [&str; 8] = [
        "User Name",
        "Exercise Name",
        "Dominance",
        "Exercise createdAt",
        "Power - High",
        "Acceleration - High",
        "Sex",
        "Resistance",
    ];

    fn bound_rows() -> Vec<Vec<&'static str>> {
        vec![
            vec!["A", "Lateral Bound", "dominant", "2024-01-01 09:00:00", "50", "5", "male", "20"],
            vec!["A", "Lateral Bound", "Dominant", "2024-01-11 09:00:00", "80", "8", "", "20"],
        ]
    }

    fn run_with(rows: &[Vec<&str>], config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
        let table = RawTable::from_strings(&HEADERS, rows);
        run(&table, config, &ReferenceTables::default())
    }

    fn with_min_days(min_days: u32) -> AnalysisConfig {
        AnalysisConfig {
            min_days_between_tests: min_days,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_min_days_end_to_end() {
        let strict = run_with(&bound_rows(), &with_min_days(30)).unwrap();
        let matrix = strict.user("A").unwrap().matrix();
        let bound: Exercise = "Lateral Bound (Dominant)".parse().unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.value(0, bound, Metric::Power), Some(50.0));
        assert_eq!(strict.group.spacing.unconstrained_days, Some(10.0));
        assert_eq!(strict.group.spacing.constrained_days, None);

        let loose = run_with(&bound_rows(), &with_min_days(5)).unwrap();
        let matrix = loose.user("A").unwrap().matrix();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.value(0, bound, Metric::Power), Some(50.0));
        assert_eq!(matrix.value(1, bound, Metric::Power), Some(80.0));
        assert_eq!(loose.group.spacing.constrained_days, Some(10.0));
    }

    #[test]
    fn test_spacing_without_minimum_matches_unconstrained() {
        let report = run_with(&bound_rows(), &AnalysisConfig::default()).unwrap();
        let spacing = &report.group.spacing;
        assert_eq!(spacing.min_days, 0);
        assert_eq!(spacing.unconstrained_days, Some(10.0));
        assert_eq!(spacing.constrained_days, spacing.unconstrained_days);
    }

    #[test]
    fn test_report_shape() {
        let report = run_with(&bound_rows(), &AnalysisConfig::default()).unwrap();
        assert_eq!(report.exercises.len(), Exercise::COUNT);
        assert_eq!(report.regions.len(), 4);
        assert_eq!(report.group.multi_test_users, vec!["A".to_string()]);

        // 50/900 and 80/900 of the male power goal
        let user = report.user("A").unwrap();
        assert_eq!(user.bracket(0, Measure::Power), Some(Bracket::Underdeveloped));
        assert!(report.group.measure(Measure::Overall).is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["users"][0]["matrix"]["slots"][0]["Lateral Bound (Dominant)"].is_object());
        assert!(json["users"][0]["matrix"]["slots"][0]["Vertical Jump (Countermovement)"].is_null());
    }

    #[test]
    fn test_validation_error_aborts() {
        let rows = vec![vec!["A", "Lateral Bound", "Dominant", "2024-01-01", "", "5", "male", "20"]];
        let err = run_with(&rows, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::EmptyValues(_))
        ));
    }

    #[test]
    fn test_standardization_requires_resistance_column() {
        let table = RawTable::from_strings(&HEADERS[..7], &[]);
        let config = AnalysisConfig {
            standardize_resistance: true,
            ..AnalysisConfig::default()
        };
        let err = run(&table, &config, &ReferenceTables::default()).unwrap_err();
        match err {
            AnalysisError::Validation(ValidationError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["resistance".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_standardization_filters_rows() {
        let mut rows = bound_rows();
        rows.push(vec!["A", "Lateral Bound", "Dominant", "2024-02-01 09:00:00", "90", "9", "male", "35"]);
        let config = AnalysisConfig {
            standardize_resistance: true,
            ..AnalysisConfig::default()
        };
        let report = run_with(&rows, &config).unwrap();
        assert_eq!(report.user("A").unwrap().test_count(), 2);
        // Activity counts are taken before filtering
        assert_eq!(report.activity.observations, 3);
    }

    #[test]
    fn test_missing_standard_is_fatal() {
        let table = RawTable::from_strings(&HEADERS, &bound_rows());
        let reference = ReferenceTables {
            standards: GoalStandards::new(),
            ..ReferenceTables::default()
        };
        let err = run(&table, &AnalysisConfig::default(), &reference).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Lookup(LookupError::MissingStandard { .. })
        ));
    }

    #[test]
    fn test_activity_summary() {
        let rows = vec![
            vec!["B", "Chest Press (One Hand)", "Dominant", "2024-01-01", "100", "5", "male", "12"],
            vec!["B", "Chest Press (One Hand)", "Dominant", "2024-01-02", "100", "5", "male", "10"],
            vec!["B", "Chest Press (One Hand)", "Dominant", "2024-01-03", "100", "5", "male", "12"],
            vec!["B", "Chest Press (One Hand)", "Dominant", "2024-01-04", "100", "5", "male", "8"],
            vec!["B", "Chest Press (One Hand)", "Dominant", "2024-01-05", "100", "5", "male", "15"],
            vec!["A", "Chest Press (One Hand)", "Dominant", "2024-01-01", "100", "5", "male", "20"],
            vec!["C", "Vertical Jump (Countermovement)", "neither", "2024-01-01", "900", "15", "female", ""],
        ];
        let report = run_with(&rows, &AnalysisConfig::default()).unwrap();
        let activity = &report.activity;
        assert_eq!(activity.observations, 7);
        assert_eq!(activity.users, 3);
        assert_eq!(activity.users_with_tests, 3);
        assert_eq!(activity.most_active_user, Some(("B".to_string(), 5)));

        let press: Exercise = "Chest Press (One Hand) (Dominant)".parse().unwrap();
        let row = &activity.exercises[press.index()];
        assert_eq!(row.executions, 6);
        assert_eq!(row.top_resistances, vec![(12.0, 2), (8.0, 1), (10.0, 1)]);
    }

    #[test]
    fn test_most_active_tie_goes_to_first_name() {
        let rows = vec![
            vec!["Z", "Lateral Bound", "Dominant", "2024-01-01", "100", "5", "male", "20"],
            vec!["M", "Lateral Bound", "Dominant", "2024-01-01", "100", "5", "male", "20"],
        ];
        let report = run_with(&rows, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.activity.most_active_user, Some(("M".to_string(), 1)));
    }
}
