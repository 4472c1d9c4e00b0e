//! Reference tables: sex-specific goal standards and standard resistances.
//!
//! Both tables are immutable once built and are handed to every stage that
//! needs them, so alternative tables can be injected in tests.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{BaseExercise, Exercise, Metric, Sex};
use crate::error::LookupError;
use crate::formulas::development_score;

/// Allowed deviation from a standard resistance (same unit as the data).
pub const RESISTANCE_TOLERANCE: f64 = 0.5;

/// Goal values for one exercise and sex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalStandard {
    /// Peak power goal in watts.
    pub power: f64,
    /// Peak acceleration goal in m/s².
    pub acceleration: f64,
}

impl GoalStandard {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Power => self.power,
            Metric::Acceleration => self.acceleration,
        }
    }
}

/// Built-in goal standards: (exercise, male power, male accel, female power, female accel).
const BUILT_IN_STANDARDS: [(BaseExercise, f64, f64, f64, f64); 10] = [
    (BaseExercise::StraightArmTrunkRotation, 550.0, 28.0, 360.0, 24.0),
    (BaseExercise::ShotPut, 600.0, 30.0, 390.0, 25.0),
    (BaseExercise::PnfD2Flexion, 350.0, 25.0, 225.0, 21.0),
    (BaseExercise::PnfD2Extension, 400.0, 27.0, 260.0, 23.0),
    (BaseExercise::BicepsCurl, 250.0, 20.0, 160.0, 17.0),
    (BaseExercise::TricepsExtension, 250.0, 22.0, 160.0, 19.0),
    (BaseExercise::HorizontalRow, 450.0, 24.0, 290.0, 20.0),
    (BaseExercise::ChestPress, 500.0, 26.0, 325.0, 22.0),
    (BaseExercise::LateralBound, 900.0, 18.0, 585.0, 15.0),
    (BaseExercise::VerticalJump, 1100.0, 20.0, 715.0, 17.0),
];

/// Sex- and exercise-keyed goal standards.
#[derive(Debug, Clone, Default)]
pub struct GoalStandards {
    entries: HashMap<(BaseExercise, Sex), GoalStandard>,
}

impl GoalStandards {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standards shipped with the bracketer.
    pub fn built_in() -> Self {
        let mut table = Self::new();
        for (base, male_power, male_accel, female_power, female_accel) in BUILT_IN_STANDARDS {
            table.insert(
                base,
                Sex::Male,
                GoalStandard {
                    power: male_power,
                    acceleration: male_accel,
                },
            );
            table.insert(
                base,
                Sex::Female,
                GoalStandard {
                    power: female_power,
                    acceleration: female_accel,
                },
            );
        }
        table
    }

    pub fn insert(&mut self, base: BaseExercise, sex: Sex, standard: GoalStandard) {
        self.entries.insert((base, sex), standard);
    }

    pub fn get(&self, base: BaseExercise, sex: Sex) -> Option<&GoalStandard> {
        self.entries.get(&(base, sex))
    }

    /// Looks up the goal value for a base exercise, sex and metric.
    pub fn lookup(&self, base: BaseExercise, sex: Sex, metric: Metric) -> Result<f64, LookupError> {
        self.get(base, sex)
            .map(|standard| standard.get(metric))
            .ok_or_else(|| LookupError::MissingStandard {
                exercise: base.to_string(),
                sex: sex.to_string(),
                metric: metric.to_string(),
            })
    }

    /// Converts a raw value into a development score (percent of goal, uncapped).
    ///
    /// The dominance side is ignored: both sides share the base exercise's goal.
    /// An absent value yields `Ok(None)` without consulting the table.
    pub fn score(
        &self,
        value: Option<f64>,
        exercise: Exercise,
        sex: Sex,
        metric: Metric,
    ) -> Result<Option<f64>, LookupError> {
        if value.is_none() {
            return Ok(None);
        }
        let standard = self.lookup(exercise.base(), sex, metric)?;
        Ok(development_score(value, standard))
    }

    /// Like [`GoalStandards::score`], taking a full exercise name.
    pub fn score_named(
        &self,
        value: Option<f64>,
        full_name: &str,
        sex: Sex,
        metric: Metric,
    ) -> Result<Option<f64>, LookupError> {
        let exercise: Exercise = full_name.parse()?;
        self.score(value, exercise, sex, metric)
    }
}

/// Built-in standard resistances in pounds.
const BUILT_IN_RESISTANCES: [(BaseExercise, f64); 10] = [
    (BaseExercise::StraightArmTrunkRotation, 10.0),
    (BaseExercise::ShotPut, 12.0),
    (BaseExercise::PnfD2Flexion, 6.0),
    (BaseExercise::PnfD2Extension, 8.0),
    (BaseExercise::BicepsCurl, 8.0),
    (BaseExercise::TricepsExtension, 6.0),
    (BaseExercise::HorizontalRow, 12.0),
    (BaseExercise::ChestPress, 12.0),
    (BaseExercise::LateralBound, 20.0),
    (BaseExercise::VerticalJump, 20.0),
];

/// Per-exercise resistance used when resistance standardization is enabled.
#[derive(Debug, Clone, Default)]
pub struct StandardResistances {
    entries: HashMap<BaseExercise, f64>,
}

impl StandardResistances {
    pub fn built_in() -> Self {
        Self {
            entries: BUILT_IN_RESISTANCES.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, base: BaseExercise, resistance: f64) {
        self.entries.insert(base, resistance);
    }

    pub fn get(&self, base: BaseExercise) -> Option<f64> {
        self.entries.get(&base).copied()
    }

    /// Returns true if `resistance` is within tolerance of the exercise's standard.
    ///
    /// Exercises without a configured standard never match.
    pub fn is_standard(&self, base: BaseExercise, resistance: f64) -> bool {
        self.get(base)
            .is_some_and(|standard| (resistance - standard).abs() <= RESISTANCE_TOLERANCE)
    }
}

/// Immutable reference data shared by every analysis stage.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub standards: GoalStandards,
    pub resistances: StandardResistances,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            standards: GoalStandards::built_in(),
            resistances: StandardResistances::built_in(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;

    #[test]
    fn test_built_in_covers_every_exercise_and_sex() {
        let table = GoalStandards::built_in();
        for base in BaseExercise::all() {
            for sex in [Sex::Male, Sex::Female] {
                for metric in Metric::all() {
                    let value = table.lookup(*base, sex, *metric).unwrap();
                    assert!(value > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_score_is_linear_in_value() {
        let table = GoalStandards::built_in();
        let bound = Exercise::new(BaseExercise::LateralBound, Some(Side::Dominant)).unwrap();
        let standard = table
            .lookup(BaseExercise::LateralBound, Sex::Male, Metric::Power)
            .unwrap();

        let score = table
            .score(Some(450.0), bound, Sex::Male, Metric::Power)
            .unwrap();
        assert_eq!(score, Some(450.0 / standard * 100.0));

        let over = table
            .score(Some(standard * 1.5), bound, Sex::Male, Metric::Power)
            .unwrap();
        assert_eq!(over, Some(150.0));
    }

    #[test]
    fn test_score_absent_value_is_absent() {
        let table = GoalStandards::built_in();
        let jump = Exercise::new(BaseExercise::VerticalJump, None).unwrap();
        assert_eq!(
            table.score(None, jump, Sex::Female, Metric::Acceleration),
            Ok(None)
        );
    }

    #[test]
    fn test_both_sides_share_base_standard() {
        let table = GoalStandards::built_in();
        let dominant = table
            .score_named(Some(100.0), "Chest Press (One Hand) (Dominant)", Sex::Male, Metric::Power)
            .unwrap();
        let non_dominant = table
            .score_named(
                Some(100.0),
                "Chest Press (One Hand) (Non-Dominant)",
                Sex::Male,
                Metric::Power,
            )
            .unwrap();
        assert_eq!(dominant, non_dominant);
    }

    #[test]
    fn test_missing_standard_is_lookup_error() {
        let table = GoalStandards::new();
        let jump = Exercise::new(BaseExercise::VerticalJump, None).unwrap();
        let err = table
            .score(Some(10.0), jump, Sex::Male, Metric::Power)
            .unwrap_err();
        assert!(matches!(err, LookupError::MissingStandard { .. }));
    }

    #[test]
    fn test_score_named_unknown_exercise() {
        let table = GoalStandards::built_in();
        let err = table
            .score_named(Some(10.0), "Bench Press", Sex::Male, Metric::Power)
            .unwrap_err();
        assert_eq!(err, LookupError::UnknownExercise("Bench Press".to_string()));
    }

    #[test]
    fn test_standard_resistance_tolerance() {
        let table = StandardResistances::built_in();
        assert!(table.is_standard(BaseExercise::ChestPress, 12.0));
        assert!(table.is_standard(BaseExercise::ChestPress, 12.5));
        assert!(table.is_standard(BaseExercise::ChestPress, 11.5));
        assert!(!table.is_standard(BaseExercise::ChestPress, 12.6));
        assert!(!StandardResistances::default().is_standard(BaseExercise::ChestPress, 12.0));
    }
}
