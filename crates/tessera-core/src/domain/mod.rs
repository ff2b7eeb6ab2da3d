//! Domain model traits for defining planning problems
//!
//! A planning problem is a single `PlanningSolution` value holding its
//! entities, their planning variables, immutable facts and the score.

mod traits;

pub use traits::PlanningSolution;
