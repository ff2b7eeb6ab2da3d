// Shadow-aware score director for solutions with shadow variables.
//
// Provides [`ShadowVariableSupport`] and [`ShadowAwareScoreDirector`], which
// refreshes shadow variables inside the change notification protocol.

use std::marker::PhantomData;

use tessera_core::{PlanningSolution, Result, TesseraError};

use super::ScoreDirector;

/// Trait for solutions that maintain shadow variables.
///
/// Shadow variables are derived values that depend on planning variables.
/// When a planning variable changes, the corresponding shadow variables must
/// be updated before constraint evaluation.
///
/// # Example
///
/// ```
/// use tessera_core::{PlanningSolution, SimpleScore};
/// use tessera_scoring::ShadowVariableSupport;
///
/// #[derive(Clone)]
/// struct Machine { task_durations: Vec<i64>, cached_load: i64 }
///
/// #[derive(Clone)]
/// struct Plan { machines: Vec<Machine>, score: Option<SimpleScore> }
///
/// impl PlanningSolution for Plan {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<Self::Score> { self.score }
///     fn set_score(&mut self, score: Option<Self::Score>) { self.score = score; }
/// }
///
/// impl ShadowVariableSupport for Plan {
///     fn update_entity_shadows(&mut self, entity_index: usize) {
///         let machine = &mut self.machines[entity_index];
///         machine.cached_load = machine.task_durations.iter().sum();
///     }
///
///     fn update_all_shadows(&mut self) {
///         for i in 0..self.machines.len() {
///             self.update_entity_shadows(i);
///         }
///     }
/// }
/// ```
pub trait ShadowVariableSupport: PlanningSolution {
    /// Updates shadow variables for the entity at `entity_index`.
    fn update_entity_shadows(&mut self, entity_index: usize);

    /// Updates shadow variables for all entities.
    ///
    /// Called when a solution is installed and by the staleness assertion.
    fn update_all_shadows(&mut self) {}
}

/// A score director that integrates shadow variable updates.
///
/// Wraps an inner director and calls
/// [`ShadowVariableSupport::update_entity_shadows`] in `after_variable_changed`
/// before forwarding, so shadows are current before constraint evaluation.
pub struct ShadowAwareScoreDirector<S, D>
where
    S: ShadowVariableSupport,
    D: ScoreDirector<S>,
{
    inner: D,
    _phantom: PhantomData<fn() -> S>,
}

impl<S, D> ShadowAwareScoreDirector<S, D>
where
    S: ShadowVariableSupport,
    D: ScoreDirector<S>,
{
    /// Wraps `inner`, refreshing all shadows of its working solution first.
    pub fn new(mut inner: D) -> Self {
        inner.working_solution_mut().update_all_shadows();
        inner.reset();
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<S, D> ScoreDirector<S> for ShadowAwareScoreDirector<S, D>
where
    S: ShadowVariableSupport,
    D: ScoreDirector<S>,
{
    fn working_solution(&self) -> &S {
        self.inner.working_solution()
    }

    fn working_solution_mut(&mut self) -> &mut S {
        self.inner.working_solution_mut()
    }

    fn set_working_solution(&mut self, mut solution: S) {
        solution.update_all_shadows();
        self.inner.set_working_solution(solution);
    }

    fn calculate_score(&mut self) -> S::Score {
        self.inner.calculate_score()
    }

    fn clone_working_solution(&self) -> S {
        self.inner.clone_working_solution()
    }

    fn before_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) {
        self.inner
            .before_variable_changed(descriptor_index, entity_index, variable_name);
    }

    fn after_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) {
        // Shadows first, then constraint evaluation.
        self.inner
            .working_solution_mut()
            .update_entity_shadows(entity_index);
        self.inner
            .after_variable_changed(descriptor_index, entity_index, variable_name);
    }

    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.before_entity_added(descriptor_index, entity_index);
    }

    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner
            .working_solution_mut()
            .update_entity_shadows(entity_index);
        self.inner.after_entity_added(descriptor_index, entity_index);
    }

    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.before_entity_removed(descriptor_index, entity_index);
    }

    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.after_entity_removed(descriptor_index, entity_index);
    }

    fn trigger_variable_listeners(&mut self) {
        self.inner.working_solution_mut().update_all_shadows();
        self.inner.trigger_variable_listeners();
    }

    fn is_incremental(&self) -> bool {
        self.inner.is_incremental()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn register_undo(&mut self, undo: Box<dyn FnOnce(&mut S) + Send>) {
        self.inner.register_undo(undo);
    }

    fn score_from_scratch(&self, solution: &S) -> Option<S::Score> {
        self.inner.score_from_scratch(solution)
    }

    fn assert_shadow_variables_are_not_stale(
        &mut self,
        working_score: S::Score,
        completed_action: &str,
    ) -> Result<()> {
        let mut refreshed = self.inner.clone_working_solution();
        refreshed.update_all_shadows();
        let Some(refreshed_score) = self.inner.score_from_scratch(&refreshed) else {
            return Ok(());
        };
        if refreshed_score != working_score {
            return Err(TesseraError::ShadowVariableStale {
                completed_action: completed_action.to_string(),
                expected: working_score.to_string(),
                actual: refreshed_score.to_string(),
            });
        }
        Ok(())
    }
}

impl<S, D> std::fmt::Debug for ShadowAwareScoreDirector<S, D>
where
    S: ShadowVariableSupport,
    D: ScoreDirector<S> + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowAwareScoreDirector")
            .field("inner", &self.inner)
            .finish()
    }
}
