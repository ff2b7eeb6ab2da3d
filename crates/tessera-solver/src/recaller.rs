//! Best solution tracking.

use tessera_core::{PlanningSolution, Score};
use tessera_scoring::ScoreDirector;
use tracing::debug;

/// Remembers the best solution seen by a solver scope.
///
/// An initialized solution always beats an uninitialized one; otherwise the
/// higher score wins. Only strict improvements replace the best.
#[derive(Debug)]
pub struct BestSolutionRecaller<S: PlanningSolution> {
    best_solution: Option<S>,
    best_score: Option<S::Score>,
    best_initialized: bool,
    improvement_count: u64,
}

impl<S: PlanningSolution> Default for BestSolutionRecaller<S> {
    fn default() -> Self {
        Self {
            best_solution: None,
            best_score: None,
            best_initialized: false,
            improvement_count: 0,
        }
    }
}

impl<S: PlanningSolution> BestSolutionRecaller<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_solution(&self) -> Option<&S> {
        self.best_solution.as_ref()
    }

    pub fn best_score(&self) -> Option<S::Score> {
        self.best_score
    }

    /// Number of times the best solution was replaced.
    pub fn improvement_count(&self) -> u64 {
        self.improvement_count
    }

    pub fn take_best_solution(&mut self) -> Option<S> {
        self.best_score = None;
        self.best_initialized = false;
        self.best_solution.take()
    }

    /// Scores the director's working solution and keeps a clone of it if it
    /// beats the best so far. Returns whether it did.
    pub fn process_working_solution<D>(&mut self, director: &mut D) -> bool
    where
        D: ScoreDirector<S> + ?Sized,
    {
        let score = director.calculate_score();
        let initialized = director.working_solution().is_initialized();
        if !self.is_improvement(score, initialized) {
            return false;
        }
        let mut best = director.clone_working_solution();
        best.set_score(Some(score));
        self.best_solution = Some(best);
        self.best_score = Some(score);
        self.best_initialized = initialized;
        self.improvement_count += 1;
        true
    }

    /// Installs a merged partition result as the working solution and
    /// records it if it beats the best so far.
    ///
    /// The director computes the authoritative score. It can differ from the
    /// sum of the partition scores when constraints span partitions; that is
    /// logged, not treated as an error.
    pub fn recall_merged<D>(
        &mut self,
        director: &mut D,
        merged: S,
        part_scores: &[S::Score],
    ) -> (S::Score, bool)
    where
        D: ScoreDirector<S> + ?Sized,
    {
        director.set_working_solution(merged);
        let improved = self.process_working_solution(director);
        let merged_score = director.calculate_score();

        let accumulated = S::Score::accumulate(part_scores.iter().copied());
        if accumulated != merged_score {
            debug!(
                event = "merged_score_mismatch",
                merged_score = %merged_score,
                accumulated_part_score = %accumulated,
                partitions = part_scores.len(),
                "merged score differs from the sum of the partition scores"
            );
        }
        (merged_score, improved)
    }

    fn is_improvement(&self, score: S::Score, initialized: bool) -> bool {
        match self.best_score {
            None => true,
            Some(best) => match (initialized, self.best_initialized) {
                (true, false) => true,
                (false, true) => false,
                _ => score > best,
            },
        }
    }
}

#[cfg(test)]
#[path = "recaller_tests.rs"]
mod tests;
