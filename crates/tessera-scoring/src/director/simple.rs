//! Simple score director with full recalculation.

use tessera_core::PlanningSolution;

use super::traits::ScoreDirector;

/// A score director that recalculates the full score each time.
///
/// The calculator is stored as a concrete generic type parameter. Every
/// change notification marks the cached score dirty. This is the reference
/// oracle the incremental directors are checked against.
pub struct SimpleScoreDirector<S: PlanningSolution, C> {
    working_solution: S,
    score_calculator: C,
    score_dirty: bool,
    cached_score: Option<S::Score>,
}

impl<S, C> SimpleScoreDirector<S, C>
where
    S: PlanningSolution,
    C: Fn(&S) -> S::Score + Send + Sync,
{
    /// Creates a new SimpleScoreDirector.
    pub fn new(solution: S, score_calculator: C) -> Self {
        SimpleScoreDirector {
            working_solution: solution,
            score_calculator,
            score_dirty: true,
            cached_score: None,
        }
    }

    /// Consumes the director, returning the working solution.
    pub fn into_working_solution(self) -> S {
        self.working_solution
    }

    fn mark_dirty(&mut self) {
        self.score_dirty = true;
    }
}

impl<S, C> ScoreDirector<S> for SimpleScoreDirector<S, C>
where
    S: PlanningSolution,
    C: Fn(&S) -> S::Score + Send + Sync,
{
    fn working_solution(&self) -> &S {
        &self.working_solution
    }

    fn working_solution_mut(&mut self) -> &mut S {
        self.mark_dirty();
        &mut self.working_solution
    }

    fn set_working_solution(&mut self, solution: S) {
        self.working_solution = solution;
        self.reset();
    }

    fn calculate_score(&mut self) -> S::Score {
        if !self.score_dirty {
            if let Some(score) = self.cached_score {
                return score;
            }
        }

        let score = (self.score_calculator)(&self.working_solution);
        self.working_solution.set_score(Some(score));
        self.cached_score = Some(score);
        self.score_dirty = false;
        score
    }

    fn before_variable_changed(
        &mut self,
        _descriptor_index: usize,
        _entity_index: usize,
        _variable_name: &str,
    ) {
        self.mark_dirty();
    }

    fn after_variable_changed(
        &mut self,
        _descriptor_index: usize,
        _entity_index: usize,
        _variable_name: &str,
    ) {
        self.mark_dirty();
    }

    fn before_entity_added(&mut self, _descriptor_index: usize, _entity_index: usize) {
        self.mark_dirty();
    }

    fn after_entity_added(&mut self, _descriptor_index: usize, _entity_index: usize) {
        self.mark_dirty();
    }

    fn before_entity_removed(&mut self, _descriptor_index: usize, _entity_index: usize) {
        self.mark_dirty();
    }

    fn after_entity_removed(&mut self, _descriptor_index: usize, _entity_index: usize) {
        self.mark_dirty();
    }

    fn reset(&mut self) {
        self.mark_dirty();
        self.cached_score = None;
    }

    fn score_from_scratch(&self, solution: &S) -> Option<S::Score> {
        Some((self.score_calculator)(solution))
    }
}
