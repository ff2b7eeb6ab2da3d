//! Termination conditions for the solver and its phases.
//!
//! A termination is a predicate over a [`Progress`] snapshot. The same
//! condition can stop the whole solver (fed the solver-wide progress) or a
//! single phase (fed the phase progress):
//!
//! ```
//! use std::time::Duration;
//! use tessera_core::SimpleScore;
//! use tessera_solver::termination::{Progress, StepCountTermination, Termination};
//!
//! let termination = StepCountTermination::new(10);
//! let mut progress = Progress::<SimpleScore>::default();
//! assert!(!termination.is_terminated(&progress));
//!
//! progress.step_count = 10;
//! progress.elapsed = Duration::from_millis(3);
//! assert!(termination.is_terminated(&progress));
//! ```

mod best_score;
mod builder;
mod composite;
mod external;
mod step_count;
mod time;
mod unimproved;

use std::fmt::Debug;
use std::time::Duration;

use tessera_core::Score;

pub use best_score::{BestScoreFeasibleTermination, BestScoreTermination};
pub use builder::build_termination;
pub use composite::{AndTermination, OrTermination};
pub use external::ExternalTermination;
pub use step_count::StepCountTermination;
pub use time::TimeTermination;
pub use unimproved::{UnimprovedStepCountTermination, UnimprovedTimeTermination};

/// Snapshot of how far solving (or one phase) has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<Sc: Score> {
    pub step_count: u64,
    pub elapsed: Duration,
    /// Best score found so far, `None` before the first evaluation.
    pub best_score: Option<Sc>,
    /// Steps since the best score last improved.
    pub unimproved_step_count: u64,
    /// Time since the best score last improved.
    pub unimproved_elapsed: Duration,
}

impl<Sc: Score> Default for Progress<Sc> {
    fn default() -> Self {
        Self {
            step_count: 0,
            elapsed: Duration::ZERO,
            best_score: None,
            unimproved_step_count: 0,
            unimproved_elapsed: Duration::ZERO,
        }
    }
}

/// Trait for determining when to stop solving.
///
/// Implementations are stateless predicates: everything they need is in the
/// [`Progress`] they are handed, so one instance can be consulted from the
/// solver and phase levels alike.
pub trait Termination<Sc: Score>: Send + Debug {
    /// Returns true if solving should terminate.
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool;
}

impl<Sc: Score> Termination<Sc> for Box<dyn Termination<Sc>> {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        (**self).is_terminated(progress)
    }
}

#[cfg(test)]
mod tests;
