//! HardMediumSoftScore - three-level score

use std::cmp::Ordering;
use std::fmt;

use super::traits::Score;

/// A score with hard, medium and soft levels, compared in that order.
///
/// Medium constraints typically express assignment coverage, such as
/// "assign as many shifts as possible", ranked above soft preferences.
///
/// ```
/// use tessera_core::HardMediumSoftScore;
///
/// let unassigned = HardMediumSoftScore::of(0, -3, 0);
/// let assigned = HardMediumSoftScore::of(0, 0, -40);
///
/// assert!(assigned > unassigned);
/// assert!(HardMediumSoftScore::of(-1, 0, 0) < unassigned);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardMediumSoftScore {
    hard: i64,
    medium: i64,
    soft: i64,
}

impl HardMediumSoftScore {
    pub const ZERO: HardMediumSoftScore = HardMediumSoftScore {
        hard: 0,
        medium: 0,
        soft: 0,
    };

    #[inline]
    pub const fn of(hard: i64, medium: i64, soft: i64) -> Self {
        HardMediumSoftScore { hard, medium, soft }
    }

    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    #[inline]
    pub const fn medium(&self) -> i64 {
        self.medium
    }

    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }
}

impl Score for HardMediumSoftScore {
    #[inline]
    fn is_feasible(&self) -> bool {
        self.hard >= 0
    }

    #[inline]
    fn zero() -> Self {
        HardMediumSoftScore::ZERO
    }
}

impl Ord for HardMediumSoftScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hard
            .cmp(&other.hard)
            .then_with(|| self.medium.cmp(&other.medium))
            .then_with(|| self.soft.cmp(&other.soft))
    }
}

score_arithmetic!(HardMediumSoftScore { hard, medium, soft });
labeled_score_parse!(HardMediumSoftScore {
    hard: "hard",
    medium: "medium",
    soft: "soft"
});

impl fmt::Debug for HardMediumSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HardMediumSoftScore({}, {}, {})",
            self.hard, self.medium, self.soft
        )
    }
}

impl fmt::Display for HardMediumSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}medium/{}soft", self.hard, self.medium, self.soft)
    }
}
