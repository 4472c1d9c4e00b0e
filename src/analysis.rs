//! Group analysis: bracket distributions, transitions and test spacing.
//!
//! Only multi-test users contribute transitions and per-test distributions;
//! single-test users are summarized separately.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::assembler::{TestInstanceMatrix, test_label};
use crate::bracket::{Bracket, TransitionKind};
use crate::config::AnalysisConfig;
use crate::development::{Measure, UserAssessment};
use crate::formulas::{mean, percentage_change};

/// A pair of consecutive tests, identified by the zero-based index of the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    pub fn new(from_slot: usize) -> Self {
        Period(from_slot)
    }

    pub fn from_slot(&self) -> usize {
        self.0
    }

    pub fn to_slot(&self) -> usize {
        self.0 + 1
    }

    /// Periods covering `test_columns` tests (none for fewer than two).
    pub fn up_to(test_columns: usize) -> impl Iterator<Item = Period> {
        (0..test_columns.saturating_sub(1)).map(Period)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Test {}-{}", self.0 + 1, self.0 + 2)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// User counts per bracket, indexed by bracket rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BracketCounts([usize; Bracket::COUNT]);

impl BracketCounts {
    pub fn add(&mut self, bracket: Bracket) {
        self.0[bracket.rank()] += 1;
    }

    pub fn get(&self, bracket: Bracket) -> usize {
        self.0[bracket.rank()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

impl Serialize for BracketCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Bracket::COUNT))?;
        for bracket in Bracket::descending() {
            map.serialize_entry(bracket, &self.get(*bracket))?;
        }
        map.end()
    }
}

/// Group transition counts: rows are starting brackets, columns ending brackets.
///
/// Rows and columns run from Elite down to Underdeveloped, so the diagonal is
/// the no-change line, cells above it are regressions and cells below it are
/// improvements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionMatrix {
    rows: [BracketCounts; Bracket::COUNT],
}

impl TransitionMatrix {
    pub fn record(&mut self, from: Bracket, to: Bracket) {
        self.rows[from.rank()].add(to);
    }

    pub fn get(&self, from: Bracket, to: Bracket) -> usize {
        self.rows[from.rank()].get(to)
    }

    pub fn row(&self, from: Bracket) -> &BracketCounts {
        &self.rows[from.rank()]
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(BracketCounts::total).sum()
    }

    /// Sum of the cells of one transition kind.
    pub fn count_of(&self, kind: TransitionKind) -> usize {
        let ascending = Bracket::ascending();
        ascending
            .iter()
            .flat_map(|from| ascending.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| TransitionKind::classify(*from, *to) == kind)
            .map(|(from, to)| self.get(from, to))
            .sum()
    }
}

impl Serialize for TransitionMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Bracket::COUNT))?;
        for from in Bracket::descending() {
            map.serialize_entry(from, self.row(*from))?;
        }
        map.end()
    }
}

/// One user's bracket movement over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub user: String,
    pub from: Bracket,
    pub to: Bracket,
}

/// Transitions of one measure over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTransitions {
    pub period: Period,
    pub matrix: TransitionMatrix,
    pub level_ups: Vec<TransitionRecord>,
    pub jumps: Vec<TransitionRecord>,
    pub regressions: Vec<TransitionRecord>,
    pub no_change: usize,
    /// Mean percentage change over users with both averages defined.
    pub average_change: Option<f64>,
    /// Users contributing to `average_change`.
    pub change_users: usize,
}

/// Transition totals summed over every period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProgressionSummary {
    pub level_ups: usize,
    pub jumps: usize,
    pub regressions: usize,
    pub no_change: usize,
}

impl ProgressionSummary {
    pub fn total(&self) -> usize {
        self.level_ups + self.jumps + self.regressions + self.no_change
    }
}

/// Distribution and transitions of one measure across multi-test users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureAnalysis {
    pub measure: Measure,
    /// Bracket counts per test, from Test 1.
    pub distribution: Vec<BracketCounts>,
    pub periods: Vec<PeriodTransitions>,
    pub progression: ProgressionSummary,
}

impl MeasureAnalysis {
    pub fn period(&self, period: Period) -> Option<&PeriodTransitions> {
        self.periods.iter().find(|p| p.period == period)
    }
}

/// Users with exactly one test instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleTestSummary {
    pub users: Vec<String>,
    pub overall: BracketCounts,
    pub average_power: Option<f64>,
    pub average_acceleration: Option<f64>,
}

/// Mean days between consecutive tests, with and without the minimum-days rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestSpacing {
    pub unconstrained_days: Option<f64>,
    pub constrained_days: Option<f64>,
    pub min_days: u32,
}

impl TestSpacing {
    /// Measures spacing over both assemblies. Without a minimum the
    /// unconstrained matrices are passed for both.
    pub fn measure<'a, U, C>(unconstrained: U, constrained: Option<C>, min_days: u32) -> Self
    where
        U: IntoIterator<Item = &'a TestInstanceMatrix>,
        C: IntoIterator<Item = &'a TestInstanceMatrix>,
    {
        Self {
            unconstrained_days: average_interval_days(unconstrained),
            constrained_days: constrained.and_then(average_interval_days),
            min_days,
        }
    }
}

/// Mean elapsed days between consecutive slots over every matrix.
pub fn average_interval_days<'a, I>(matrices: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a TestInstanceMatrix>,
{
    mean(
        matrices
            .into_iter()
            .flat_map(|m| m.slot_intervals_days())
            .map(Some),
    )
}

/// Group-level results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAnalysis {
    pub multi_test_users: Vec<String>,
    pub single_test: SingleTestSummary,
    /// Number of tests covered by distributions and periods.
    pub test_columns: usize,
    pub measures: Vec<MeasureAnalysis>,
    pub spacing: TestSpacing,
}

impl GroupAnalysis {
    pub fn measure(&self, measure: Measure) -> Option<&MeasureAnalysis> {
        self.measures.iter().find(|m| m.measure == measure)
    }

    /// Column labels of the distribution tables.
    pub fn test_labels(&self) -> Vec<String> {
        (0..self.test_columns).map(test_label).collect()
    }
}

/// Analyzes bracket movement across every user.
pub fn analyze_group(
    users: &[UserAssessment],
    config: &AnalysisConfig,
    spacing: TestSpacing,
) -> GroupAnalysis {
    let (multi, single): (Vec<&UserAssessment>, Vec<&UserAssessment>) =
        users.iter().partition(|u| u.is_multi_test());

    let max_slots = multi.iter().map(|u| u.test_count()).max().unwrap_or(0);
    let test_columns = config.test_columns(max_slots);

    let measures = Measure::all()
        .iter()
        .map(|&measure| analyze_measure(&multi, measure, test_columns))
        .collect();

    GroupAnalysis {
        multi_test_users: multi.iter().map(|u| u.user().to_string()).collect(),
        single_test: summarize_single_tests(&single),
        test_columns,
        measures,
        spacing,
    }
}

fn analyze_measure(users: &[&UserAssessment], measure: Measure, test_columns: usize) -> MeasureAnalysis {
    let distribution = (0..test_columns)
        .map(|slot| {
            let mut counts = BracketCounts::default();
            for bracket in users.iter().filter_map(|u| u.bracket(slot, measure)) {
                counts.add(bracket);
            }
            counts
        })
        .collect();

    let periods: Vec<PeriodTransitions> = Period::up_to(test_columns)
        .map(|period| analyze_period(users, measure, period))
        .collect();

    let progression = periods
        .iter()
        .fold(ProgressionSummary::default(), |mut acc, p| {
            acc.level_ups += p.level_ups.len();
            acc.jumps += p.jumps.len();
            acc.regressions += p.regressions.len();
            acc.no_change += p.no_change;
            acc
        });

    MeasureAnalysis {
        measure,
        distribution,
        periods,
        progression,
    }
}

fn analyze_period(users: &[&UserAssessment], measure: Measure, period: Period) -> PeriodTransitions {
    let mut matrix = TransitionMatrix::default();
    let mut level_ups = Vec::new();
    let mut jumps = Vec::new();
    let mut regressions = Vec::new();
    let mut no_change = 0;

    for user in users {
        let (Some(from), Some(to)) = (
            user.bracket(period.from_slot(), measure),
            user.bracket(period.to_slot(), measure),
        ) else {
            continue;
        };

        matrix.record(from, to);
        let record = TransitionRecord {
            user: user.user().to_string(),
            from,
            to,
        };
        match TransitionKind::classify(from, to) {
            TransitionKind::NoChange => no_change += 1,
            TransitionKind::LevelUp => level_ups.push(record),
            TransitionKind::Jump => jumps.push(record),
            TransitionKind::Regression => regressions.push(record),
        }
    }

    let changes: Vec<Option<f64>> = users
        .iter()
        .map(|u| {
            percentage_change(
                u.average(period.from_slot(), measure),
                u.average(period.to_slot(), measure),
            )
        })
        .filter(Option::is_some)
        .collect();

    PeriodTransitions {
        period,
        matrix,
        level_ups,
        jumps,
        regressions,
        no_change,
        change_users: changes.len(),
        average_change: mean(changes),
    }
}

fn summarize_single_tests(users: &[&UserAssessment]) -> SingleTestSummary {
    let mut overall = BracketCounts::default();
    for bracket in users.iter().filter_map(|u| u.bracket(0, Measure::Overall)) {
        overall.add(bracket);
    }

    SingleTestSummary {
        users: users.iter().map(|u| u.user().to_string()).collect(),
        overall,
        average_power: mean(users.iter().map(|u| u.average(0, Measure::Power))),
        average_acceleration: mean(users.iter().map(|u| u.average(0, Measure::Acceleration))),
    }
}
