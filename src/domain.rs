//! Domain types: the exercise taxonomy, athletes and normalized observations.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::error::LookupError;

/// Athlete sex, used to select goal standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(format!("invalid sex: {}", s)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured quantity of an exercise execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Power,
    Acceleration,
}

impl Metric {
    pub fn all() -> &'static [Metric] {
        &[Metric::Power, Metric::Acceleration]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Power => "Power",
            Metric::Acceleration => "Acceleration",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Named grouping of related exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyRegion {
    Torso,
    Arms,
    PressPull,
    Legs,
}

impl BodyRegion {
    pub fn all() -> &'static [BodyRegion] {
        &[
            BodyRegion::Torso,
            BodyRegion::Arms,
            BodyRegion::PressPull,
            BodyRegion::Legs,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BodyRegion::Torso => "Torso",
            BodyRegion::Arms => "Arms",
            BodyRegion::PressPull => "Press/Pull",
            BodyRegion::Legs => "Legs",
        }
    }

    /// Base exercises belonging to this region, in taxonomy order.
    pub fn exercises(&self) -> &'static [BaseExercise] {
        match self {
            BodyRegion::Torso => &[
                BaseExercise::StraightArmTrunkRotation,
                BaseExercise::ShotPut,
            ],
            BodyRegion::Arms => &[
                BaseExercise::PnfD2Flexion,
                BaseExercise::PnfD2Extension,
                BaseExercise::BicepsCurl,
                BaseExercise::TricepsExtension,
            ],
            BodyRegion::PressPull => &[BaseExercise::HorizontalRow, BaseExercise::ChestPress],
            BodyRegion::Legs => &[BaseExercise::LateralBound, BaseExercise::VerticalJump],
        }
    }

    /// Full exercises (with dominance variants) belonging to this region.
    pub fn full_exercises(&self) -> Vec<Exercise> {
        Exercise::all()
            .filter(|exercise| exercise.base().region() == *self)
            .collect()
    }
}

impl fmt::Display for BodyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for BodyRegion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// How an exercise treats the dominance column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominanceRule {
    /// Must be performed and recorded per side.
    Required,
    /// Recorded without a side. `allow_sided` additionally accepts a
    /// Dominant/Non-Dominant marker, which is not carried into the name.
    Unsided { allow_sided: bool },
}

/// Exercises recognized by the bracketer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseExercise {
    StraightArmTrunkRotation,
    ShotPut,
    PnfD2Flexion,
    PnfD2Extension,
    BicepsCurl,
    TricepsExtension,
    HorizontalRow,
    ChestPress,
    LateralBound,
    VerticalJump,
}

impl BaseExercise {
    pub fn all() -> &'static [BaseExercise] {
        &[
            BaseExercise::StraightArmTrunkRotation,
            BaseExercise::ShotPut,
            BaseExercise::PnfD2Flexion,
            BaseExercise::PnfD2Extension,
            BaseExercise::BicepsCurl,
            BaseExercise::TricepsExtension,
            BaseExercise::HorizontalRow,
            BaseExercise::ChestPress,
            BaseExercise::LateralBound,
            BaseExercise::VerticalJump,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BaseExercise::StraightArmTrunkRotation => "Straight Arm Trunk Rotation",
            BaseExercise::ShotPut => "Shot Put (Countermovement)",
            BaseExercise::PnfD2Flexion => "PNF D2 Flexion",
            BaseExercise::PnfD2Extension => "PNF D2 Extension",
            BaseExercise::BicepsCurl => "Biceps Curl (One Hand)",
            BaseExercise::TricepsExtension => "Triceps Extension (One Hand)",
            BaseExercise::HorizontalRow => "Horizontal Row (One Hand)",
            BaseExercise::ChestPress => "Chest Press (One Hand)",
            BaseExercise::LateralBound => "Lateral Bound",
            BaseExercise::VerticalJump => "Vertical Jump (Countermovement)",
        }
    }

    pub fn region(&self) -> BodyRegion {
        match self {
            BaseExercise::StraightArmTrunkRotation | BaseExercise::ShotPut => BodyRegion::Torso,
            BaseExercise::PnfD2Flexion
            | BaseExercise::PnfD2Extension
            | BaseExercise::BicepsCurl
            | BaseExercise::TricepsExtension => BodyRegion::Arms,
            BaseExercise::HorizontalRow | BaseExercise::ChestPress => BodyRegion::PressPull,
            BaseExercise::LateralBound | BaseExercise::VerticalJump => BodyRegion::Legs,
        }
    }

    pub fn dominance_rule(&self) -> DominanceRule {
        match self {
            BaseExercise::ShotPut => DominanceRule::Unsided { allow_sided: true },
            BaseExercise::VerticalJump => DominanceRule::Unsided { allow_sided: false },
            _ => DominanceRule::Required,
        }
    }

    /// Returns true if the canonicalized dominance is permitted for this exercise.
    pub fn permits(&self, dominance: Option<&Dominance>) -> bool {
        match (self.dominance_rule(), dominance) {
            (DominanceRule::Required, Some(Dominance::Side(_))) => true,
            (DominanceRule::Required, _) => false,
            (DominanceRule::Unsided { .. }, None) => true,
            (DominanceRule::Unsided { .. }, Some(Dominance::Other(raw))) => raw == "neither",
            (DominanceRule::Unsided { allow_sided }, Some(Dominance::Side(_))) => allow_sided,
        }
    }

    /// Resolves the full exercise for a permitted dominance value.
    ///
    /// Returns None when the combination is not permitted.
    pub fn with_dominance(&self, dominance: Option<&Dominance>) -> Option<Exercise> {
        if !self.permits(dominance) {
            return None;
        }
        let side = match (self.dominance_rule(), dominance) {
            (DominanceRule::Required, Some(Dominance::Side(side))) => Some(*side),
            _ => None,
        };
        Exercise::new(*self, side)
    }
}

impl FromStr for BaseExercise {
    type Err = LookupError;

    /// Names must match the taxonomy exactly, including case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseExercise::all()
            .iter()
            .find(|base| base.display_name() == s)
            .copied()
            .ok_or_else(|| LookupError::UnknownExercise(s.to_string()))
    }
}

impl fmt::Display for BaseExercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Performing side of a unilateral exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Dominant,
    NonDominant,
}

impl Side {
    pub fn display_name(&self) -> &'static str {
        match self {
            Side::Dominant => "Dominant",
            Side::NonDominant => "Non-Dominant",
        }
    }
}

/// Canonicalized value of the dominance column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dominance {
    Side(Side),
    /// Any other marker, trimmed and lower-cased (e.g. "neither").
    Other(String),
}

impl Dominance {
    /// Canonicalizes a raw dominance cell. Blank input yields None.
    pub fn canonicalize(raw: &str) -> Option<Dominance> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return None;
        }
        let dominance = match value.as_str() {
            "dominant" => Dominance::Side(Side::Dominant),
            "non-dominant" | "non dominant" | "nondominant" | "non_dominant" => {
                Dominance::Side(Side::NonDominant)
            }
            _ => Dominance::Other(value),
        };
        Some(dominance)
    }
}

const TAXONOMY: [(BaseExercise, Option<Side>); 18] = [
    (BaseExercise::StraightArmTrunkRotation, Some(Side::Dominant)),
    (BaseExercise::StraightArmTrunkRotation, Some(Side::NonDominant)),
    (BaseExercise::ShotPut, None),
    (BaseExercise::PnfD2Flexion, Some(Side::Dominant)),
    (BaseExercise::PnfD2Flexion, Some(Side::NonDominant)),
    (BaseExercise::PnfD2Extension, Some(Side::Dominant)),
    (BaseExercise::PnfD2Extension, Some(Side::NonDominant)),
    (BaseExercise::BicepsCurl, Some(Side::Dominant)),
    (BaseExercise::BicepsCurl, Some(Side::NonDominant)),
    (BaseExercise::TricepsExtension, Some(Side::Dominant)),
    (BaseExercise::TricepsExtension, Some(Side::NonDominant)),
    (BaseExercise::HorizontalRow, Some(Side::Dominant)),
    (BaseExercise::HorizontalRow, Some(Side::NonDominant)),
    (BaseExercise::ChestPress, Some(Side::Dominant)),
    (BaseExercise::ChestPress, Some(Side::NonDominant)),
    (BaseExercise::LateralBound, Some(Side::Dominant)),
    (BaseExercise::LateralBound, Some(Side::NonDominant)),
    (BaseExercise::VerticalJump, None),
];

/// A full exercise: base exercise plus side where the taxonomy requires one.
///
/// Values are indices into the fixed taxonomy, so every `Exercise` is valid and
/// ordering follows taxonomy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Exercise(usize);

impl Exercise {
    /// Number of full exercises in the taxonomy.
    pub const COUNT: usize = TAXONOMY.len();

    /// Iterates all full exercises in taxonomy order.
    pub fn all() -> impl Iterator<Item = Exercise> + Clone {
        (0..Self::COUNT).map(Exercise)
    }

    /// Looks up a full exercise. Returns None for combinations outside the taxonomy.
    pub fn new(base: BaseExercise, side: Option<Side>) -> Option<Exercise> {
        TAXONOMY
            .iter()
            .position(|entry| *entry == (base, side))
            .map(Exercise)
    }

    /// Position in the taxonomy, usable as a dense array index.
    pub fn index(&self) -> usize {
        self.0
    }

    pub fn base(&self) -> BaseExercise {
        TAXONOMY[self.0].0
    }

    pub fn side(&self) -> Option<Side> {
        TAXONOMY[self.0].1
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side() {
            Some(side) => write!(f, "{} ({})", self.base(), side.display_name()),
            None => write!(f, "{}", self.base()),
        }
    }
}

impl FromStr for Exercise {
    type Err = LookupError;

    /// Parses a full exercise name such as "Lateral Bound (Dominant)".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exercise::all()
            .find(|exercise| exercise.to_string() == s)
            .ok_or_else(|| LookupError::UnknownExercise(s.to_string()))
    }
}

impl Serialize for Exercise {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A normalized exercise execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub user: String,
    pub sex: Sex,
    pub exercise: Exercise,
    pub timestamp: NaiveDateTime,
    pub power: Option<f64>,
    pub acceleration: Option<f64>,
    pub resistance: Option<f64>,
}

impl Observation {
    /// Creates an observation without a resistance value.
    pub fn new(
        user: impl Into<String>,
        sex: Sex,
        exercise: Exercise,
        timestamp: NaiveDateTime,
        power: Option<f64>,
        acceleration: Option<f64>,
    ) -> Self {
        Self {
            user: user.into(),
            sex,
            exercise,
            timestamp,
            power,
            acceleration,
            resistance: None,
        }
    }

    pub fn with_resistance(mut self, resistance: Option<f64>) -> Self {
        self.resistance = resistance;
        self
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Power => self.power,
            Metric::Acceleration => self.acceleration,
        }
    }

    pub fn has_both_metrics(&self) -> bool {
        self.power.is_some() && self.acceleration.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_from_str_case_insensitive() {
        assert_eq!(Sex::from_str("Male").unwrap(), Sex::Male);
        assert_eq!(Sex::from_str("FEMALE").unwrap(), Sex::Female);
        assert_eq!(Sex::from_str("  female ").unwrap(), Sex::Female);
        assert!(Sex::from_str("other").is_err());
    }

    #[test]
    fn test_taxonomy_has_eighteen_full_exercises() {
        assert_eq!(Exercise::COUNT, 18);
        assert_eq!(Exercise::all().count(), 18);
        for base in BaseExercise::all() {
            let variants = Exercise::all().filter(|e| e.base() == *base).count();
            match base.dominance_rule() {
                DominanceRule::Required => assert_eq!(variants, 2, "{}", base),
                DominanceRule::Unsided { .. } => assert_eq!(variants, 1, "{}", base),
            }
        }
    }

    #[test]
    fn test_exercise_display_names() {
        let bound = Exercise::new(BaseExercise::LateralBound, Some(Side::Dominant)).unwrap();
        assert_eq!(bound.to_string(), "Lateral Bound (Dominant)");

        let row = Exercise::new(BaseExercise::HorizontalRow, Some(Side::NonDominant)).unwrap();
        assert_eq!(row.to_string(), "Horizontal Row (One Hand) (Non-Dominant)");

        let jump = Exercise::new(BaseExercise::VerticalJump, None).unwrap();
        assert_eq!(jump.to_string(), "Vertical Jump (Countermovement)");
    }

    #[test]
    fn test_exercise_from_str_round_trips_every_name() {
        for exercise in Exercise::all() {
            assert_eq!(Exercise::from_str(&exercise.to_string()).unwrap(), exercise);
        }
        assert!(Exercise::from_str("Lateral Bound").is_err());
        assert!(Exercise::from_str("Back Squat").is_err());
    }

    #[test]
    fn test_names_match_taxonomy_case() {
        assert_eq!(BaseExercise::from_str("Lateral Bound"), Ok(BaseExercise::LateralBound));
        assert!(BaseExercise::from_str("lateral bound").is_err());
        assert!(Exercise::from_str("lateral bound (dominant)").is_err());
    }

    #[test]
    fn test_exercise_new_rejects_untaxonomic_side() {
        assert!(Exercise::new(BaseExercise::VerticalJump, Some(Side::Dominant)).is_none());
        assert!(Exercise::new(BaseExercise::BicepsCurl, None).is_none());
    }

    #[test]
    fn test_dominance_canonicalize() {
        assert_eq!(
            Dominance::canonicalize("DOMINANT"),
            Some(Dominance::Side(Side::Dominant))
        );
        assert_eq!(
            Dominance::canonicalize(" Non-Dominant "),
            Some(Dominance::Side(Side::NonDominant))
        );
        assert_eq!(
            Dominance::canonicalize("non dominant"),
            Some(Dominance::Side(Side::NonDominant))
        );
        assert_eq!(
            Dominance::canonicalize("Neither"),
            Some(Dominance::Other("neither".to_string()))
        );
        assert_eq!(Dominance::canonicalize("   "), None);
    }

    #[test]
    fn test_dominance_rules() {
        let dominant = Dominance::Side(Side::Dominant);
        let neither = Dominance::Other("neither".to_string());
        let left = Dominance::Other("left".to_string());

        assert!(BaseExercise::LateralBound.permits(Some(&dominant)));
        assert!(!BaseExercise::LateralBound.permits(Some(&neither)));
        assert!(!BaseExercise::LateralBound.permits(None));

        assert!(BaseExercise::VerticalJump.permits(Some(&neither)));
        assert!(BaseExercise::VerticalJump.permits(None));
        assert!(!BaseExercise::VerticalJump.permits(Some(&dominant)));
        assert!(!BaseExercise::VerticalJump.permits(Some(&left)));

        assert!(BaseExercise::ShotPut.permits(Some(&dominant)));
        assert!(BaseExercise::ShotPut.permits(Some(&neither)));
        assert!(!BaseExercise::ShotPut.permits(Some(&left)));
    }

    #[test]
    fn test_shot_put_never_carries_side_suffix() {
        let dominant = Dominance::Side(Side::NonDominant);
        let exercise = BaseExercise::ShotPut.with_dominance(Some(&dominant)).unwrap();
        assert_eq!(exercise.to_string(), "Shot Put (Countermovement)");
    }

    #[test]
    fn test_regions_cover_taxonomy() {
        let total: usize = BodyRegion::all()
            .iter()
            .map(|r| r.full_exercises().len())
            .sum();
        assert_eq!(total, Exercise::COUNT);
        for region in BodyRegion::all() {
            for base in region.exercises() {
                assert_eq!(base.region(), *region);
            }
        }
    }
}
