//! Score-based termination conditions.

use tessera_core::Score;

use super::{Progress, Termination};

/// Terminates when best score reaches or exceeds a target.
///
/// # Example
///
/// ```
/// use tessera_core::SimpleScore;
/// use tessera_solver::termination::BestScoreTermination;
///
/// let term = BestScoreTermination::new(SimpleScore::of(0));
/// ```
#[derive(Debug, Clone)]
pub struct BestScoreTermination<Sc: Score> {
    target_score: Sc,
}

impl<Sc: Score> BestScoreTermination<Sc> {
    pub fn new(target_score: Sc) -> Self {
        Self { target_score }
    }
}

impl<Sc: Score> Termination<Sc> for BestScoreTermination<Sc> {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        progress
            .best_score
            .is_some_and(|score| score >= self.target_score)
    }
}

/// Terminates when the best score becomes feasible.
#[derive(Debug, Clone, Default)]
pub struct BestScoreFeasibleTermination;

impl<Sc: Score> Termination<Sc> for BestScoreFeasibleTermination {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        progress.best_score.is_some_and(|score| score.is_feasible())
    }
}
