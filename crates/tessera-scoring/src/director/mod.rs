//! Score director implementations.
//!
//! # Score Director Types
//!
//! - [`SimpleScoreDirector`] - full recalculation, the reference oracle
//! - [`IncrementalScoreDirector`] - O(change) scoring through an
//!   [`IncrementalScoreCalculator`](crate::IncrementalScoreCalculator)
//! - [`RecordingScoreDirector`] - automatic undo tracking wrapper
//! - [`ShadowAwareScoreDirector`] - shadow variable integration wrapper

mod factory;
mod incremental;
mod simple;
mod traits;

pub mod recording;
pub mod shadow_aware;

#[cfg(test)]
mod tests;

pub use factory::{
    IncrementalScoreDirectorFactory, ScoreDirectorFactory, ShadowAwareScoreDirectorFactory,
    SimpleScoreDirectorFactory,
};
pub use incremental::{AssertionScoreFn, CalculatorConstructor, IncrementalScoreDirector};
pub use recording::RecordingScoreDirector;
pub use shadow_aware::{ShadowAwareScoreDirector, ShadowVariableSupport};
pub use simple::SimpleScoreDirector;
pub use traits::ScoreDirector;
