//! Boilerplate shared by the level-based score types.

/// Field-wise `Add`, `Sub` and `Neg`, and a `PartialOrd` that defers to the
/// type's `Ord`.
///
/// ```ignore
/// score_arithmetic!(HardSoftScore { hard, soft });
/// ```
macro_rules! score_arithmetic {
    ($score:ident { $($level:ident),+ }) => {
        impl PartialOrd for $score {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl std::ops::Add for $score {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self { $($level: self.$level + rhs.$level),+ }
            }
        }

        impl std::ops::Sub for $score {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self { $($level: self.$level - rhs.$level),+ }
            }
        }

        impl std::ops::Neg for $score {
            type Output = Self;

            fn neg(self) -> Self {
                Self { $($level: -self.$level),+ }
            }
        }
    };
}

/// `ParseableScore` for the labeled notation, e.g. `"-2hard/-15soft"`.
///
/// Levels are listed highest priority first, each with its label.
///
/// ```ignore
/// labeled_score_parse!(HardSoftScore { hard: "hard", soft: "soft" });
/// ```
macro_rules! labeled_score_parse {
    ($score:ident { $($level:ident: $label:literal),+ }) => {
        impl $crate::score::ParseableScore for $score {
            fn parse(text: &str) -> Result<Self, $crate::score::ScoreParseError> {
                let labels = [$($label),+];
                let values =
                    $crate::score::traits::parse_labeled_levels(stringify!($score), text, &labels)?;
                let mut values = values.into_iter();
                Ok(Self { $($level: values.next().unwrap_or_default()),+ })
            }

            fn to_string_repr(&self) -> String {
                [$(format!("{}{}", self.$level, $label)),+].join("/")
            }
        }
    };
}
