//! Score traits

use std::fmt::{self, Debug, Display};
use std::ops::{Add, Neg, Sub};

/// A totally ordered measure of solution quality; higher is better.
///
/// Incremental score calculators rely on the additive structure: a running
/// score is updated by adding the delta of each mutation, so `Add`, `Sub` and
/// `zero()` must form a proper group over the levels. Multi-level scores
/// compare their highest priority level first.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + Eq
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// True when every hard constraint is satisfied.
    fn is_feasible(&self) -> bool;

    /// The identity element for addition.
    fn zero() -> Self;

    /// Adds up a sequence of scores, starting from `zero()`.
    ///
    /// This is the accumulation rule used when partition scores are combined.
    fn accumulate<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        scores.into_iter().fold(Self::zero(), |total, score| total + score)
    }
}

/// Scores that can be read from configuration, such as a best score limit.
pub trait ParseableScore: Score {
    /// Parses a score from its text form.
    ///
    /// - SimpleScore: `"42"` or `"42init"`
    /// - HardSoftScore: `"0hard/-100soft"`
    fn parse(s: &str) -> Result<Self, ScoreParseError>;

    /// Returns the text form accepted by [`parse`](Self::parse).
    fn to_string_repr(&self) -> String;
}

/// Error when parsing a score from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl Display for ScoreParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}

/// Splits `"{n}{label}/{n}{label}..."` into one number per label.
pub(crate) fn parse_labeled_levels(
    type_name: &str,
    text: &str,
    labels: &[&str],
) -> Result<Vec<i64>, ScoreParseError> {
    let text = text.trim();
    let parts: Vec<&str> = text.split('/').map(str::trim).collect();
    if parts.len() != labels.len() {
        return Err(ScoreParseError {
            message: format!(
                "Invalid {type_name} '{text}': expected {} levels separated by '/'",
                labels.len()
            ),
        });
    }
    parts
        .iter()
        .zip(labels)
        .map(|(part, label)| {
            let digits = part.strip_suffix(label).ok_or_else(|| ScoreParseError {
                message: format!("Invalid {type_name} '{text}': '{part}' must end with '{label}'"),
            })?;
            digits.parse::<i64>().map_err(|e| ScoreParseError {
                message: format!("Invalid {type_name} '{text}': {label} level '{digits}': {e}"),
            })
        })
        .collect()
}
