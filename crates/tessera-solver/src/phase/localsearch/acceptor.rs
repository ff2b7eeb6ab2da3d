//! Acceptors for local search move acceptance.
//!
//! Acceptors decide whether a move is good enough to become a step
//! candidate by comparing its score with the last step score.

use std::fmt::Debug;

use tessera_core::Score;

/// Default size of the late acceptance score history.
pub const DEFAULT_LATE_ACCEPTANCE_SIZE: usize = 400;

/// Trait for accepting or rejecting moves in local search.
pub trait Acceptor<Sc: Score>: Send + Debug {
    /// Returns true if a move resulting in `move_score` should be accepted,
    /// given the previous step's score.
    fn is_accepted(&self, last_step_score: &Sc, move_score: &Sc) -> bool;

    /// Called when a phase starts.
    fn phase_started(&mut self, _initial_score: &Sc) {}

    /// Called when a step ends with an accepted move.
    fn step_ended(&mut self, _step_score: &Sc) {}
}

/// Accepts moves that do not worsen the last step score.
#[derive(Debug, Clone, Copy, Default)]
pub struct HillClimbingAcceptor;

impl<Sc: Score> Acceptor<Sc> for HillClimbingAcceptor {
    fn is_accepted(&self, last_step_score: &Sc, move_score: &Sc) -> bool {
        move_score >= last_step_score
    }
}

/// Late acceptance acceptor - accepts moves that do not worsen the last step
/// score or the step score from `late_acceptance_size` steps ago.
///
/// ```
/// use tessera_core::SimpleScore;
/// use tessera_solver::phase::localsearch::{Acceptor, LateAcceptanceAcceptor};
///
/// let mut acceptor = LateAcceptanceAcceptor::new(2);
/// acceptor.phase_started(&SimpleScore::of(-10));
/// acceptor.step_ended(&SimpleScore::of(-3));
///
/// // Worse than the last step, but no worse than the late score.
/// assert!(acceptor.is_accepted(&SimpleScore::of(-3), &SimpleScore::of(-10)));
/// assert!(!acceptor.is_accepted(&SimpleScore::of(-3), &SimpleScore::of(-11)));
/// ```
#[derive(Debug, Clone)]
pub struct LateAcceptanceAcceptor<Sc: Score> {
    /// Circular buffer of historical step scores.
    score_history: Vec<Sc>,
    /// Slot compared against, then overwritten, by the next step.
    current_index: usize,
}

impl<Sc: Score> LateAcceptanceAcceptor<Sc> {
    /// Creates a new late acceptance acceptor; a size of 0 is raised to 1.
    pub fn new(late_acceptance_size: usize) -> Self {
        Self {
            score_history: vec![Sc::zero(); late_acceptance_size.max(1)],
            current_index: 0,
        }
    }

    pub fn late_acceptance_size(&self) -> usize {
        self.score_history.len()
    }
}

impl<Sc: Score> Default for LateAcceptanceAcceptor<Sc> {
    fn default() -> Self {
        Self::new(DEFAULT_LATE_ACCEPTANCE_SIZE)
    }
}

impl<Sc: Score> Acceptor<Sc> for LateAcceptanceAcceptor<Sc> {
    fn is_accepted(&self, last_step_score: &Sc, move_score: &Sc) -> bool {
        move_score >= &self.score_history[self.current_index] || move_score >= last_step_score
    }

    fn phase_started(&mut self, initial_score: &Sc) {
        self.score_history.fill(*initial_score);
        self.current_index = 0;
    }

    fn step_ended(&mut self, step_score: &Sc) {
        self.score_history[self.current_index] = *step_score;
        self.current_index = (self.current_index + 1) % self.score_history.len();
    }
}
