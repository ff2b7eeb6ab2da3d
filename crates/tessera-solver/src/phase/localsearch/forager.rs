//! Forager for local search move selection.

use tessera_core::Score;

/// Collects accepted moves during a step and picks the best one.
///
/// Once `accepted_count_limit` moves were accepted the step quits early.
/// Among the collected moves the highest score wins, the earliest on ties.
///
/// ```
/// use tessera_core::SimpleScore;
/// use tessera_solver::phase::localsearch::AcceptedCountForager;
///
/// let mut forager = AcceptedCountForager::new(2);
/// forager.add_move("a", SimpleScore::of(-4));
/// assert!(!forager.is_quit_early());
/// forager.add_move("b", SimpleScore::of(-1));
/// assert!(forager.is_quit_early());
/// assert_eq!(forager.pick_move(), Some(("b", SimpleScore::of(-1))));
/// ```
#[derive(Debug, Clone)]
pub struct AcceptedCountForager<M, Sc: Score> {
    accepted_count_limit: usize,
    accepted_moves: Vec<(M, Sc)>,
}

impl<M, Sc: Score> AcceptedCountForager<M, Sc> {
    pub fn new(accepted_count_limit: usize) -> Self {
        Self {
            accepted_count_limit: accepted_count_limit.max(1),
            accepted_moves: Vec::new(),
        }
    }

    pub fn accepted_count_limit(&self) -> usize {
        self.accepted_count_limit
    }

    /// Called at the start of each step to reset state.
    pub fn step_started(&mut self) {
        self.accepted_moves.clear();
    }

    pub fn add_move(&mut self, m: M, score: Sc) {
        self.accepted_moves.push((m, score));
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted_moves.len()
    }

    pub fn is_quit_early(&self) -> bool {
        self.accepted_moves.len() >= self.accepted_count_limit
    }

    /// Takes the best collected move, `None` if nothing was accepted.
    pub fn pick_move(&mut self) -> Option<(M, Sc)> {
        let mut best_index: Option<usize> = None;
        for (index, (_, score)) in self.accepted_moves.iter().enumerate() {
            match best_index {
                Some(best) if self.accepted_moves[best].1 >= *score => {}
                _ => best_index = Some(index),
            }
        }
        let picked = best_index.map(|index| self.accepted_moves.swap_remove(index));
        self.accepted_moves.clear();
        picked
    }
}
