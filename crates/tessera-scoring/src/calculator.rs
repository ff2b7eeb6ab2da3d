//! The incremental score calculation contract.

use tessera_core::PlanningSolution;

/// Maintains a running score across bracketed mutations of a solution.
///
/// The owning [`IncrementalScoreDirector`](crate::IncrementalScoreDirector)
/// calls `before_*` with the solution in its pre-mutation state and the
/// matching `after_*` with the solution in its post-mutation state. A typical
/// implementation retracts the entity's contribution in `before_*` and
/// inserts the new contribution in `after_*`, so that
/// [`calculate_score`](Self::calculate_score) is O(1).
///
/// Law: replaying any sequence of correctly bracketed mutations yields the
/// same score as calling [`reset_working_solution`](Self::reset_working_solution)
/// on the final solution.
///
/// # Example
///
/// ```
/// use tessera_core::{PlanningSolution, SimpleScore};
/// use tessera_scoring::IncrementalScoreCalculator;
///
/// #[derive(Clone)]
/// struct Bins { loads: Vec<i64>, score: Option<SimpleScore> }
///
/// impl PlanningSolution for Bins {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<SimpleScore> { self.score }
///     fn set_score(&mut self, score: Option<SimpleScore>) { self.score = score; }
/// }
///
/// // Penalizes the total load.
/// #[derive(Default)]
/// struct LoadCalculator { total: i64 }
///
/// impl IncrementalScoreCalculator<Bins> for LoadCalculator {
///     fn reset_working_solution(&mut self, solution: &Bins) {
///         self.total = solution.loads.iter().sum();
///     }
///     fn before_variable_changed(&mut self, solution: &Bins, entity_index: usize, _: &str) {
///         self.total -= solution.loads[entity_index];
///     }
///     fn after_variable_changed(&mut self, solution: &Bins, entity_index: usize, _: &str) {
///         self.total += solution.loads[entity_index];
///     }
///     fn calculate_score(&self) -> SimpleScore {
///         SimpleScore::of(-self.total)
///     }
/// }
///
/// let mut bins = Bins { loads: vec![3, 4], score: None };
/// let mut calculator = LoadCalculator::default();
/// calculator.reset_working_solution(&bins);
///
/// calculator.before_variable_changed(&bins, 1, "load");
/// bins.loads[1] = 1;
/// calculator.after_variable_changed(&bins, 1, "load");
///
/// assert_eq!(calculator.calculate_score(), SimpleScore::of(-4));
/// ```
pub trait IncrementalScoreCalculator<S: PlanningSolution>: Send {
    /// Discards all state and initializes from `solution`.
    fn reset_working_solution(&mut self, solution: &S);

    /// Called before a planning variable of the entity is changed.
    fn before_variable_changed(&mut self, solution: &S, entity_index: usize, variable_name: &str);

    /// Called after a planning variable of the entity was changed.
    fn after_variable_changed(&mut self, solution: &S, entity_index: usize, variable_name: &str);

    /// Called before an entity is added to the solution.
    fn before_entity_added(&mut self, _solution: &S, _entity_index: usize) {}

    /// Called after an entity was added.
    ///
    /// Defaults to a full reset, which is correct but not incremental.
    fn after_entity_added(&mut self, solution: &S, _entity_index: usize) {
        self.reset_working_solution(solution);
    }

    /// Called before an entity is removed from the solution.
    fn before_entity_removed(&mut self, _solution: &S, _entity_index: usize) {}

    /// Called after an entity was removed.
    ///
    /// Defaults to a full reset.
    fn after_entity_removed(&mut self, solution: &S, _entity_index: usize) {
        self.reset_working_solution(solution);
    }

    /// Returns the current cumulative score.
    fn calculate_score(&self) -> S::Score;
}
