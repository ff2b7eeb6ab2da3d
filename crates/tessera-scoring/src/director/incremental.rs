//! Incremental score director driven by an [`IncrementalScoreCalculator`].

use std::fmt;
use std::sync::Arc;

use tessera_core::PlanningSolution;

use super::traits::ScoreDirector;
use crate::calculator::IncrementalScoreCalculator;

/// Builds a fresh calculator; used to score a solution from scratch.
pub type CalculatorConstructor<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// Full recalculation used by the assert modes instead of a fresh calculator.
pub type AssertionScoreFn<S> = Arc<dyn Fn(&S) -> <S as PlanningSolution>::Score + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Variable,
    EntityAdded,
    EntityRemoved,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Variable => write!(f, "variable_changed"),
            ChangeKind::EntityAdded => write!(f, "entity_added"),
            ChangeKind::EntityRemoved => write!(f, "entity_removed"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct PendingChange {
    kind: ChangeKind,
    descriptor_index: usize,
    entity_index: usize,
    variable_name: String,
}

/// A score director that forwards every bracketed mutation to an
/// [`IncrementalScoreCalculator`] and reads the score from it in O(1).
///
/// The director checks bracket discipline: every `after_*` notification must
/// close an open `before_*` of the same kind for the same entity (and
/// variable). An unmatched `after_*` is a programming error in the caller and
/// panics.
///
/// # Example
///
/// ```
/// use tessera_core::{PlanningSolution, SimpleScore};
/// use tessera_scoring::{IncrementalScoreCalculator, IncrementalScoreDirector, ScoreDirector};
///
/// #[derive(Clone)]
/// struct Counter { values: Vec<i64>, score: Option<SimpleScore> }
///
/// impl PlanningSolution for Counter {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<SimpleScore> { self.score }
///     fn set_score(&mut self, score: Option<SimpleScore>) { self.score = score; }
/// }
///
/// #[derive(Default)]
/// struct SumCalculator { sum: i64 }
///
/// impl IncrementalScoreCalculator<Counter> for SumCalculator {
///     fn reset_working_solution(&mut self, s: &Counter) { self.sum = s.values.iter().sum(); }
///     fn before_variable_changed(&mut self, s: &Counter, i: usize, _: &str) { self.sum -= s.values[i]; }
///     fn after_variable_changed(&mut self, s: &Counter, i: usize, _: &str) { self.sum += s.values[i]; }
///     fn calculate_score(&self) -> SimpleScore { SimpleScore::of(self.sum) }
/// }
///
/// let solution = Counter { values: vec![1, 2, 3], score: None };
/// let mut director = IncrementalScoreDirector::new(solution, SumCalculator::default());
/// assert_eq!(director.calculate_score(), SimpleScore::of(6));
///
/// director.before_variable_changed(0, 2, "value");
/// director.working_solution_mut().values[2] = 10;
/// director.after_variable_changed(0, 2, "value");
/// assert_eq!(director.calculate_score(), SimpleScore::of(13));
/// ```
pub struct IncrementalScoreDirector<S: PlanningSolution, C> {
    working_solution: S,
    calculator: C,
    pending: Vec<PendingChange>,
    fresh_calculator: Option<CalculatorConstructor<C>>,
    assertion_score_fn: Option<AssertionScoreFn<S>>,
}

impl<S, C> IncrementalScoreDirector<S, C>
where
    S: PlanningSolution,
    C: IncrementalScoreCalculator<S>,
{
    /// Creates a director and initializes the calculator from `solution`.
    pub fn new(solution: S, mut calculator: C) -> Self {
        calculator.reset_working_solution(&solution);
        Self {
            working_solution: solution,
            calculator,
            pending: Vec::new(),
            fresh_calculator: None,
            assertion_score_fn: None,
        }
    }

    /// Enables from-scratch scoring by building fresh calculators.
    pub fn with_fresh_calculator(mut self, constructor: CalculatorConstructor<C>) -> Self {
        self.fresh_calculator = Some(constructor);
        self
    }

    /// Uses `score_fn` as the from-scratch oracle of the assert modes.
    pub fn with_assertion_score_fn(mut self, score_fn: AssertionScoreFn<S>) -> Self {
        self.assertion_score_fn = Some(score_fn);
        self
    }

    /// Returns the calculator.
    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    /// Returns the number of `before_*` notifications still waiting for
    /// their `after_*`.
    pub fn pending_change_count(&self) -> usize {
        self.pending.len()
    }

    /// Consumes the director, returning the working solution.
    pub fn into_working_solution(self) -> S {
        self.working_solution
    }

    fn open(
        &mut self,
        kind: ChangeKind,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) {
        self.pending.push(PendingChange {
            kind,
            descriptor_index,
            entity_index,
            variable_name: variable_name.to_string(),
        });
    }

    fn close(
        &mut self,
        kind: ChangeKind,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) {
        let position = self.pending.iter().rposition(|p| {
            p.kind == kind
                && p.descriptor_index == descriptor_index
                && p.entity_index == entity_index
                && p.variable_name == variable_name
        });
        match position {
            Some(position) => {
                self.pending.remove(position);
            }
            None => panic!(
                "programming error: after_{kind}(descriptor {descriptor_index}, entity \
                 {entity_index}, variable {variable_name:?}) was called without a matching \
                 before_{kind}"
            ),
        }
    }
}

impl<S, C> ScoreDirector<S> for IncrementalScoreDirector<S, C>
where
    S: PlanningSolution,
    C: IncrementalScoreCalculator<S>,
{
    fn working_solution(&self) -> &S {
        &self.working_solution
    }

    fn working_solution_mut(&mut self) -> &mut S {
        &mut self.working_solution
    }

    fn set_working_solution(&mut self, solution: S) {
        self.working_solution = solution;
        self.reset();
    }

    fn calculate_score(&mut self) -> S::Score {
        let score = self.calculator.calculate_score();
        self.working_solution.set_score(Some(score));
        score
    }

    fn before_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) {
        self.open(ChangeKind::Variable, descriptor_index, entity_index, variable_name);
        self.calculator
            .before_variable_changed(&self.working_solution, entity_index, variable_name);
    }

    fn after_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) {
        self.close(ChangeKind::Variable, descriptor_index, entity_index, variable_name);
        self.calculator
            .after_variable_changed(&self.working_solution, entity_index, variable_name);
    }

    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize) {
        self.open(ChangeKind::EntityAdded, descriptor_index, entity_index, "");
        self.calculator
            .before_entity_added(&self.working_solution, entity_index);
    }

    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize) {
        self.close(ChangeKind::EntityAdded, descriptor_index, entity_index, "");
        self.calculator
            .after_entity_added(&self.working_solution, entity_index);
    }

    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) {
        self.open(ChangeKind::EntityRemoved, descriptor_index, entity_index, "");
        self.calculator
            .before_entity_removed(&self.working_solution, entity_index);
    }

    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) {
        self.close(ChangeKind::EntityRemoved, descriptor_index, entity_index, "");
        self.calculator
            .after_entity_removed(&self.working_solution, entity_index);
    }

    fn is_incremental(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        if !self.pending.is_empty() {
            tracing::trace!(
                event = "pending_changes_discarded",
                count = self.pending.len()
            );
        }
        self.pending.clear();
        self.calculator.reset_working_solution(&self.working_solution);
    }

    fn score_from_scratch(&self, solution: &S) -> Option<S::Score> {
        if let Some(score_fn) = &self.assertion_score_fn {
            return Some(score_fn(solution));
        }
        let constructor = self.fresh_calculator.as_ref()?;
        let mut calculator = constructor();
        calculator.reset_working_solution(solution);
        Some(calculator.calculate_score())
    }
}

impl<S, C> fmt::Debug for IncrementalScoreDirector<S, C>
where
    S: PlanningSolution,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalScoreDirector")
            .field("pending", &self.pending)
            .field("has_fresh_calculator", &self.fresh_calculator.is_some())
            .field("has_assertion_score_fn", &self.assertion_score_fn.is_some())
            .finish()
    }
}
