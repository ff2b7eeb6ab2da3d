//! Score calculation for Tessera.
//!
//! This crate provides:
//! - The [`ScoreDirector`] trait: owner of a working solution and its score
//! - The [`IncrementalScoreCalculator`] contract for O(change) scoring
//! - Directors: simple (from scratch), incremental, recording (undo) and
//!   shadow-aware wrappers, plus factories building one director per solution
//!
//! # Change notification protocol
//!
//! Every mutation of the working solution is bracketed:
//!
//! ```text
//! director.before_variable_changed(0, entity, "row");
//! director.working_solution_mut().rows[entity] = new_row;
//! director.after_variable_changed(0, entity, "row");
//! let score = director.calculate_score();
//! ```
//!
//! Incremental directors rely on the brackets to retract and re-insert the
//! entity's score contribution.

pub mod calculator;
pub mod director;

pub use calculator::IncrementalScoreCalculator;
pub use director::{
    IncrementalScoreDirector, IncrementalScoreDirectorFactory, RecordingScoreDirector,
    ScoreDirector, ScoreDirectorFactory, ShadowAwareScoreDirector,
    ShadowAwareScoreDirectorFactory, ShadowVariableSupport, SimpleScoreDirector,
    SimpleScoreDirectorFactory,
};
