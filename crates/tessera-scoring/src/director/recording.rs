// Recording score director for automatic undo tracking.
//
// Wraps an existing score director and stores typed undo closures registered
// by moves:
//
// ```text
// let mut recording = RecordingScoreDirector::new(&mut inner);
// move.do_move(&mut recording);      // registers its undo closure
// let score = recording.calculate_score();
// recording.undo_changes();          // runs undo closures in reverse order
// ```

use tessera_core::{PlanningSolution, Result};

use super::ScoreDirector;

/// A score director wrapper that stores typed undo closures.
///
/// Moves capture old values and register the closure restoring them via
/// `register_undo()`. `undo_changes()` re-brackets every entity touched by
/// the move, so incremental calculators see the undo as an ordinary change.
///
/// # Example
///
/// ```
/// use tessera_core::{PlanningSolution, SimpleScore};
/// use tessera_scoring::{RecordingScoreDirector, ScoreDirector, SimpleScoreDirector};
///
/// #[derive(Clone)]
/// struct Solution { value: i64, score: Option<SimpleScore> }
///
/// impl PlanningSolution for Solution {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<Self::Score> { self.score }
///     fn set_score(&mut self, score: Option<Self::Score>) { self.score = score; }
/// }
///
/// let mut director = SimpleScoreDirector::new(
///     Solution { value: 10, score: None },
///     |s: &Solution| SimpleScore::of(s.value),
/// );
///
/// let mut recording = RecordingScoreDirector::new(&mut director);
/// let old_value = recording.working_solution().value;
/// recording.before_variable_changed(0, 0, "value");
/// recording.working_solution_mut().value = 20;
/// recording.after_variable_changed(0, 0, "value");
/// recording.register_undo(Box::new(move |s| s.value = old_value));
/// assert_eq!(recording.calculate_score(), SimpleScore::of(20));
///
/// recording.undo_changes();
/// assert_eq!(recording.working_solution().value, 10);
/// assert_eq!(recording.calculate_score(), SimpleScore::of(10));
/// ```
pub struct RecordingScoreDirector<'a, S: PlanningSolution> {
    inner: &'a mut dyn ScoreDirector<S>,
    undo_stack: Vec<Box<dyn FnOnce(&mut S) + Send>>,
    // (descriptor_index, entity_index) pairs to re-bracket on undo.
    modified_entities: Vec<(usize, usize)>,
}

impl<'a, S: PlanningSolution> RecordingScoreDirector<'a, S> {
    /// Creates a new recording score director wrapping the inner director.
    pub fn new(inner: &'a mut dyn ScoreDirector<S>) -> Self {
        Self {
            inner,
            undo_stack: Vec::with_capacity(16),
            modified_entities: Vec::with_capacity(8),
        }
    }

    /// Undoes all recorded changes in reverse order.
    ///
    /// 1. Retract the post-move contribution of each modified entity
    /// 2. Run the undo closures
    /// 3. Insert the restored contributions
    pub fn undo_changes(&mut self) {
        for &(descriptor_index, entity_index) in &self.modified_entities {
            self.inner
                .before_variable_changed(descriptor_index, entity_index, "");
        }

        while let Some(undo) = self.undo_stack.pop() {
            undo(self.inner.working_solution_mut());
        }

        for (descriptor_index, entity_index) in self.modified_entities.drain(..) {
            self.inner
                .after_variable_changed(descriptor_index, entity_index, "");
        }
    }

    /// Clears the recording state for reuse in the next step.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.modified_entities.clear();
    }

    /// Returns the number of recorded undo closures.
    pub fn change_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns true if there are no recorded changes.
    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }
}

impl<S: PlanningSolution> ScoreDirector<S> for RecordingScoreDirector<'_, S> {
    fn working_solution(&self) -> &S {
        self.inner.working_solution()
    }

    fn working_solution_mut(&mut self) -> &mut S {
        self.inner.working_solution_mut()
    }

    fn set_working_solution(&mut self, solution: S) {
        self.clear();
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
        self.inner
            .after_variable_changed(descriptor_index, entity_index, variable_name);

        let key = (descriptor_index, entity_index);
        if !self.modified_entities.contains(&key) {
            self.modified_entities.push(key);
        }
    }

    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.before_entity_added(descriptor_index, entity_index);
    }

    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.after_entity_added(descriptor_index, entity_index);
    }

    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.before_entity_removed(descriptor_index, entity_index);
    }

    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) {
        self.inner.after_entity_removed(descriptor_index, entity_index);
    }

    fn trigger_variable_listeners(&mut self) {
        self.inner.trigger_variable_listeners();
    }

    fn is_incremental(&self) -> bool {
        self.inner.is_incremental()
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.clear();
    }

    fn register_undo(&mut self, undo: Box<dyn FnOnce(&mut S) + Send>) {
        self.undo_stack.push(undo);
    }

    fn score_from_scratch(&self, solution: &S) -> Option<S::Score> {
        self.inner.score_from_scratch(solution)
    }

    fn assert_shadow_variables_are_not_stale(
        &mut self,
        working_score: S::Score,
        completed_action: &str,
    ) -> Result<()> {
        self.inner
            .assert_shadow_variables_are_not_stale(working_score, completed_action)
    }
}
