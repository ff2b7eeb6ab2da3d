// Score director trait definition.

use tessera_core::{PlanningSolution, Result, TesseraError};

/// The score director manages solution state and score calculation.
///
/// It is responsible for:
/// - Owning the working solution
/// - Calculating scores (incrementally when possible)
/// - Receiving the before/after notifications that bracket every mutation
/// - Running the consistency assertions used by the assert environment modes
///
/// A director is owned by exactly one thread at a time. Partition workers
/// each build their own director from a [`ScoreDirectorFactory`](super::ScoreDirectorFactory).
pub trait ScoreDirector<S: PlanningSolution>: Send {
    /// Returns a reference to the working solution.
    fn working_solution(&self) -> &S;

    /// Returns a mutable reference to the working solution.
    ///
    /// Mutations must be bracketed by the change notifications below.
    fn working_solution_mut(&mut self) -> &mut S;

    /// Replaces the working solution and re-initializes all score state.
    fn set_working_solution(&mut self, solution: S);

    /// Calculates and returns the current score.
    fn calculate_score(&mut self) -> S::Score;

    /// Clones the working solution.
    fn clone_working_solution(&self) -> S {
        self.working_solution().clone()
    }

    /// Called before a planning variable is changed.
    fn before_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    );

    /// Called after a planning variable is changed.
    fn after_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    );

    /// Called before an entity is added to the working solution.
    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize);

    /// Called after an entity was added to the working solution.
    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize);

    /// Called before an entity is removed from the working solution.
    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize);

    /// Called after an entity was removed from the working solution.
    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize);

    /// Triggers shadow variable listeners to update derived values.
    fn trigger_variable_listeners(&mut self) {}

    /// Returns true if this score director supports incremental scoring.
    fn is_incremental(&self) -> bool {
        false
    }

    /// Resets the score director state.
    fn reset(&mut self) {}

    /// Registers a typed undo closure.
    ///
    /// Only [`RecordingScoreDirector`](super::RecordingScoreDirector) stores
    /// them; other directors drop the closure.
    fn register_undo(&mut self, _undo: Box<dyn FnOnce(&mut S) + Send>) {}

    /// Scores `solution` from scratch, without touching any incremental state.
    ///
    /// Returns `None` when the director has no independent way to do so, in
    /// which case the from-scratch assertions are skipped.
    fn score_from_scratch(&self, _solution: &S) -> Option<S::Score> {
        None
    }

    /// Fails with [`TesseraError::ScoreCorruption`] if the working score
    /// differs from a full recalculation of the working solution.
    fn assert_working_score_from_scratch(
        &mut self,
        working_score: S::Score,
        completed_action: &str,
    ) -> Result<()> {
        let Some(uncorrupted) = self.score_from_scratch(self.working_solution()) else {
            return Ok(());
        };
        if uncorrupted != working_score {
            return Err(TesseraError::ScoreCorruption {
                completed_action: completed_action.to_string(),
                expected: uncorrupted.to_string(),
                actual: working_score.to_string(),
            });
        }
        Ok(())
    }

    /// Fails with [`TesseraError::ScoreCorruption`] if the director's current
    /// score differs from `expected`.
    fn assert_expected_working_score(
        &mut self,
        expected: S::Score,
        completed_action: &str,
    ) -> Result<()> {
        let actual = self.calculate_score();
        if actual != expected {
            return Err(TesseraError::ScoreCorruption {
                completed_action: completed_action.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    /// Fails with [`TesseraError::ShadowVariableStale`] if refreshing every
    /// shadow variable would change the score.
    ///
    /// Directors without shadow variables have nothing to check.
    fn assert_shadow_variables_are_not_stale(
        &mut self,
        _working_score: S::Score,
        _completed_action: &str,
    ) -> Result<()> {
        Ok(())
    }
}

