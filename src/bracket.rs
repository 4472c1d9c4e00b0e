//! Development brackets and bracket-to-bracket transitions.
//!
//! Two schemes exist. [`Bracket`] is the canonical five-bucket scheme used for
//! every computation in this crate (distributions, transitions, regressions).
//! [`PresentationBracket`] is the six-bucket wording used in athlete-facing copy;
//! it is derived from a score independently and never feeds back into analysis.
//!
//! Mapping between the two for a capped average `s`:
//!
//! | score            | Bracket        | PresentationBracket      |
//! |------------------|----------------|--------------------------|
//! | s ≤ 25           | Underdeveloped | Severely Under Developed |
//! | 25 < s ≤ 50      | Developing     | Under Developed          |
//! | 50 < s ≤ 75      | Intermediate   | Average                  |
//! | 75 < s < 90      | Advanced       | Above Average            |
//! | 90 ≤ s < 100     | Elite          | Elite                    |
//! | s ≥ 100          | Elite          | Goal Hit                 |

use std::fmt;

use serde::{Serialize, Serializer};

/// Canonical development bracket, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bracket {
    Underdeveloped,
    Developing,
    Intermediate,
    Advanced,
    Elite,
}

impl Bracket {
    /// Number of brackets in the scheme.
    pub const COUNT: usize = 5;

    /// Brackets from lowest to highest.
    pub fn ascending() -> &'static [Bracket] {
        &[
            Bracket::Underdeveloped,
            Bracket::Developing,
            Bracket::Intermediate,
            Bracket::Advanced,
            Bracket::Elite,
        ]
    }

    /// Brackets from highest to lowest, the row/column order of transition matrices.
    pub fn descending() -> &'static [Bracket] {
        &[
            Bracket::Elite,
            Bracket::Advanced,
            Bracket::Intermediate,
            Bracket::Developing,
            Bracket::Underdeveloped,
        ]
    }

    /// Position in the ascending order (Underdeveloped = 0).
    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bracket::Underdeveloped => "Underdeveloped",
            Bracket::Developing => "Developing",
            Bracket::Intermediate => "Intermediate",
            Bracket::Advanced => "Advanced",
            Bracket::Elite => "Elite",
        }
    }

    /// Classifies a capped slot average.
    pub fn from_score(score: f64) -> Bracket {
        if score <= 25.0 {
            Bracket::Underdeveloped
        } else if score <= 50.0 {
            Bracket::Developing
        } else if score <= 75.0 {
            Bracket::Intermediate
        } else if score < 90.0 {
            Bracket::Advanced
        } else {
            Bracket::Elite
        }
    }

    /// Classifies an optional average; absence has no bracket.
    pub fn categorize(score: Option<f64>) -> Option<Bracket> {
        score.map(Bracket::from_score)
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Bracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Athlete-facing six-bucket wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PresentationBracket {
    SeverelyUnderDeveloped,
    UnderDeveloped,
    Average,
    AboveAverage,
    Elite,
    GoalHit,
}

impl PresentationBracket {
    pub fn label(&self) -> &'static str {
        match self {
            PresentationBracket::SeverelyUnderDeveloped => "Severely Under Developed",
            PresentationBracket::UnderDeveloped => "Under Developed",
            PresentationBracket::Average => "Average",
            PresentationBracket::AboveAverage => "Above Average",
            PresentationBracket::Elite => "Elite",
            PresentationBracket::GoalHit => "Goal Hit",
        }
    }

    pub fn from_score(score: f64) -> PresentationBracket {
        if score >= 100.0 {
            PresentationBracket::GoalHit
        } else if score >= 90.0 {
            PresentationBracket::Elite
        } else if score > 75.0 {
            PresentationBracket::AboveAverage
        } else if score > 50.0 {
            PresentationBracket::Average
        } else if score > 25.0 {
            PresentationBracket::UnderDeveloped
        } else {
            PresentationBracket::SeverelyUnderDeveloped
        }
    }
}

impl fmt::Display for PresentationBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PresentationBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Kind of movement between two consecutive brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    NoChange,
    /// Up exactly one bracket.
    LevelUp,
    /// Up two or more brackets.
    Jump,
    /// Down any number of brackets.
    Regression,
}

impl TransitionKind {
    pub fn classify(from: Bracket, to: Bracket) -> TransitionKind {
        let (from, to) = (from.rank(), to.rank());
        if to == from {
            TransitionKind::NoChange
        } else if to < from {
            TransitionKind::Regression
        } else if to - from == 1 {
            TransitionKind::LevelUp
        } else {
            TransitionKind::Jump
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransitionKind::NoChange => "no_change",
            TransitionKind::LevelUp => "level_up",
            TransitionKind::Jump => "jump",
            TransitionKind::Regression => "regression",
        }
    }
}
