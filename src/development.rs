//! Development scoring of assembled test instances.
//!
//! Each raw value becomes a percentage of its goal standard. Slot averages cap
//! every score at 100 before averaging and skip absent scores; the overall
//! slot average is the mean of the power and acceleration averages and is
//! defined only when both are.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::assembler::TestInstanceMatrix;
use crate::bracket::{Bracket, PresentationBracket};
use crate::domain::{Exercise, Metric, Sex};
use crate::error::LookupError;
use crate::formulas::{capped_mean, mean_of_both};
use crate::standards::GoalStandards;

/// Quantity a bracket or average refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Power,
    Acceleration,
    Overall,
}

impl Measure {
    pub fn all() -> &'static [Measure] {
        &[Measure::Power, Measure::Acceleration, Measure::Overall]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Measure::Power => "Power",
            Measure::Acceleration => "Acceleration",
            Measure::Overall => "Overall",
        }
    }
}

impl From<Metric> for Measure {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Power => Measure::Power,
            Metric::Acceleration => Measure::Acceleration,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Uncapped development scores of one slot, indexed by taxonomy position.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotScores([Option<f64>; Exercise::COUNT]);

impl SlotScores {
    pub fn get(&self, exercise: Exercise) -> Option<f64> {
        self.0[exercise.index()]
    }

    /// Capped mean over every exercise with a score.
    pub fn capped_average(&self) -> Option<f64> {
        capped_mean(self.0.iter().copied())
    }

    /// Capped mean over the given exercises only.
    pub fn capped_average_of(&self, exercises: &[Exercise]) -> Option<f64> {
        capped_mean(exercises.iter().map(|e| self.get(*e)))
    }
}

impl Serialize for SlotScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Exercise::COUNT))?;
        for exercise in Exercise::all() {
            map.serialize_entry(&exercise, &self.get(exercise))?;
        }
        map.end()
    }
}

/// Development scores for one metric across all of a user's slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevelopmentMatrix {
    metric: Metric,
    slots: Vec<SlotScores>,
}

impl DevelopmentMatrix {
    /// Scores every cell of a raw matrix for one metric.
    ///
    /// # Errors
    /// Returns LookupError if a recorded exercise has no goal standard.
    pub fn score(
        matrix: &TestInstanceMatrix,
        standards: &GoalStandards,
        metric: Metric,
    ) -> Result<Self, LookupError> {
        let sex = matrix.sex();
        let slots = matrix
            .slots()
            .iter()
            .map(|slot| -> Result<SlotScores, LookupError> {
                let mut scores = [None; Exercise::COUNT];
                for exercise in Exercise::all() {
                    scores[exercise.index()] =
                        standards.score(slot.value(exercise, metric), exercise, sex, metric)?;
                }
                Ok(SlotScores(scores))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { metric, slots })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn slots(&self) -> &[SlotScores] {
        &self.slots
    }

    /// Uncapped score at a zero-based slot index.
    pub fn get(&self, slot: usize, exercise: Exercise) -> Option<f64> {
        self.slots.get(slot).and_then(|s| s.get(exercise))
    }

    /// Capped slot average; None past the last slot or when nothing was scored.
    pub fn slot_average(&self, slot: usize) -> Option<f64> {
        self.slots.get(slot).and_then(SlotScores::capped_average)
    }
}

/// Power, acceleration and overall averages of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotAverages {
    pub power: Option<f64>,
    pub acceleration: Option<f64>,
    pub overall: Option<f64>,
}

impl SlotAverages {
    pub fn get(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Power => self.power,
            Measure::Acceleration => self.acceleration,
            Measure::Overall => self.overall,
        }
    }
}

/// Brackets of one slot per measure; None where the average is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotBrackets {
    pub power: Option<Bracket>,
    pub acceleration: Option<Bracket>,
    pub overall: Option<Bracket>,
    /// Athlete-facing wording of the overall average.
    pub presentation: Option<PresentationBracket>,
}

impl SlotBrackets {
    fn from_averages(averages: &SlotAverages) -> Self {
        Self {
            power: Bracket::categorize(averages.power),
            acceleration: Bracket::categorize(averages.acceleration),
            overall: Bracket::categorize(averages.overall),
            presentation: averages.overall.map(PresentationBracket::from_score),
        }
    }

    pub fn get(&self, measure: Measure) -> Option<Bracket> {
        match measure {
            Measure::Power => self.power,
            Measure::Acceleration => self.acceleration,
            Measure::Overall => self.overall,
        }
    }
}

/// A user's raw matrix together with its scores, averages and brackets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAssessment {
    user: String,
    sex: Sex,
    matrix: TestInstanceMatrix,
    power: DevelopmentMatrix,
    acceleration: DevelopmentMatrix,
    averages: Vec<SlotAverages>,
    brackets: Vec<SlotBrackets>,
}

impl UserAssessment {
    /// Scores a user's matrix against the goal standards.
    pub fn assess(matrix: TestInstanceMatrix, standards: &GoalStandards) -> Result<Self, LookupError> {
        let power = DevelopmentMatrix::score(&matrix, standards, Metric::Power)?;
        let acceleration = DevelopmentMatrix::score(&matrix, standards, Metric::Acceleration)?;

        let averages: Vec<SlotAverages> = (0..matrix.len())
            .map(|slot| {
                let power_avg = power.slot_average(slot);
                let accel_avg = acceleration.slot_average(slot);
                SlotAverages {
                    power: power_avg,
                    acceleration: accel_avg,
                    overall: mean_of_both(power_avg, accel_avg),
                }
            })
            .collect();
        let brackets = averages.iter().map(SlotBrackets::from_averages).collect();

        Ok(Self {
            user: matrix.user().to_string(),
            sex: matrix.sex(),
            matrix,
            power,
            acceleration,
            averages,
            brackets,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn matrix(&self) -> &TestInstanceMatrix {
        &self.matrix
    }

    pub fn development(&self, metric: Metric) -> &DevelopmentMatrix {
        match metric {
            Metric::Power => &self.power,
            Metric::Acceleration => &self.acceleration,
        }
    }

    /// Number of test instances.
    pub fn test_count(&self) -> usize {
        self.averages.len()
    }

    pub fn is_multi_test(&self) -> bool {
        self.test_count() > 1
    }

    pub fn averages(&self) -> &[SlotAverages] {
        &self.averages
    }

    /// Average for a zero-based slot; None past the last slot.
    pub fn average(&self, slot: usize, measure: Measure) -> Option<f64> {
        self.averages.get(slot).and_then(|a| a.get(measure))
    }

    /// Bracket for a zero-based slot; None past the last slot or when undefined.
    pub fn bracket(&self, slot: usize, measure: Measure) -> Option<Bracket> {
        self.brackets.get(slot).and_then(|b| b.get(measure))
    }

    /// Presentation wording of a slot's overall average.
    pub fn presentation(&self, slot: usize) -> Option<PresentationBracket> {
        self.brackets.get(slot).and_then(|b| b.presentation)
    }

    pub fn brackets(&self) -> &[SlotBrackets] {
        &self.brackets
    }
}

/// Scores every user's matrix, in user order.
///
/// Users are scored in parallel; the result order matches the input map.
pub fn assess_all(
    matrices: &BTreeMap<String, TestInstanceMatrix>,
    standards: &GoalStandards,
) -> Result<Vec<UserAssessment>, LookupError> {
    matrices
        .values()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|matrix| UserAssessment::assess(matrix.clone(), standards))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assembler::tests::{bound, day, jump, press};
    use crate::assembler::{AssemblyMode, TestInstanceAssembler};
    use crate::domain::Observation;

    pub(crate) fn assess(observations: &[Observation]) -> Vec<UserAssessment> {
        let matrices =
            TestInstanceAssembler::new(AssemblyMode::Unconstrained).assemble(observations);
        assess_all(&matrices, &GoalStandards::built_in()).unwrap()
    }

    fn reading(exercise: Exercise, offset: i64, power: f64, accel: f64) -> Observation {
        Observation::new("A", Sex::Male, exercise, day(offset), Some(power), Some(accel))
    }

    #[test]
    fn test_development_matrix_is_uncapped() {
        // Lateral Bound male goals: 900 W, 18 m/s²
        let users = assess(&[reading(bound(), 0, 1800.0, 9.0)]);
        let power = users[0].development(Metric::Power);
        assert_eq!(power.get(0, bound()), Some(200.0));
        assert_eq!(power.get(0, press()), None);
        assert_eq!(users[0].development(Metric::Acceleration).get(0, bound()), Some(50.0));
    }

    #[test]
    fn test_slot_average_caps_each_score() {
        // Chest press goal 500 W; bound goal 900 W
        let users = assess(&[
            reading(bound(), 0, 1800.0, 18.0),
            reading(press(), 0, 250.0, 13.0),
        ]);
        let averages = users[0].averages()[0];
        assert_eq!(averages.power, Some(75.0));
        assert_eq!(averages.acceleration, Some(75.0));
        assert_eq!(averages.overall, Some(75.0));
        assert_eq!(users[0].bracket(0, Measure::Overall), Some(Bracket::Intermediate));
        assert_eq!(users[0].presentation(0), Some(PresentationBracket::Average));
    }

    #[test]
    fn test_presentation_wording_follows_overall_average() {
        let users = assess(&[
            reading(jump(), 0, 1100.0, 20.0),
            reading(jump(), 14, 1100.0, 14.0),
        ]);
        assert_eq!(users[0].bracket(0, Measure::Overall), Some(Bracket::Elite));
        assert_eq!(users[0].presentation(0), Some(PresentationBracket::GoalHit));
        assert_eq!(users[0].presentation(1), Some(PresentationBracket::AboveAverage));
        assert_eq!(users[0].presentation(2), None);

        let json = serde_json::to_value(users[0].brackets()).unwrap();
        assert_eq!(json[0]["presentation"], "Goal Hit");
        assert_eq!(json[0]["overall"], "Elite");
    }

    #[test]
    fn test_overall_undefined_when_a_metric_is_missing() {
        let observation =
            Observation::new("A", Sex::Male, jump(), day(0), Some(1100.0), None);
        let users = assess(&[observation]);
        let averages = users[0].averages()[0];
        assert_eq!(averages.power, Some(100.0));
        assert_eq!(averages.acceleration, None);
        assert_eq!(averages.overall, None);
        assert_eq!(users[0].bracket(0, Measure::Power), Some(Bracket::Elite));
        assert_eq!(users[0].bracket(0, Measure::Overall), None);
        assert_eq!(users[0].presentation(0), None);
    }

    #[test]
    fn test_female_standards_are_used() {
        // Vertical jump female goals: 715 W, 17 m/s²
        let observation =
            Observation::new("F", Sex::Female, jump(), day(0), Some(715.0), Some(8.5));
        let users = assess(&[observation]);
        assert_eq!(users[0].average(0, Measure::Power), Some(100.0));
        assert_eq!(users[0].average(0, Measure::Acceleration), Some(50.0));
    }

    #[test]
    fn test_missing_standard_aborts_assessment() {
        let matrices = TestInstanceAssembler::new(AssemblyMode::Unconstrained)
            .assemble(&[reading(bound(), 0, 100.0, 10.0)]);
        let err = assess_all(&matrices, &GoalStandards::new()).unwrap_err();
        assert!(matches!(err, LookupError::MissingStandard { .. }));
    }

    #[test]
    fn test_assess_all_keeps_user_order() {
        let data: Vec<Observation> = ["D", "B", "C", "A"]
            .iter()
            .map(|u| Observation::new(*u, Sex::Male, bound(), day(0), Some(450.0), Some(9.0)))
            .collect();
        let users = assess(&data);
        let names: Vec<&str> = users.iter().map(|u| u.user()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }
}
