//! Score types for representing solution quality
//!
//! Scores are used to compare solutions and guide the optimization process.
//! All score types are immutable `Copy` values with arithmetic, so that a
//! score director can maintain a running total by adding and subtracting
//! deltas.

#[macro_use]
mod macros;

mod hard_medium_soft;
mod hard_soft;
mod simple;
mod traits;


pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use simple::SimpleScore;
pub use traits::{ParseableScore, Score, ScoreParseError};
