//! Score director factories.
//!
//! A factory builds one independent director per solution. The partitioned
//! search phase shares a factory across worker threads, so every factory is
//! `Send + Sync`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tessera_core::PlanningSolution;

use super::incremental::{AssertionScoreFn, CalculatorConstructor, IncrementalScoreDirector};
use super::shadow_aware::{ShadowAwareScoreDirector, ShadowVariableSupport};
use super::simple::SimpleScoreDirector;
use super::ScoreDirector;
use crate::calculator::IncrementalScoreCalculator;

/// Builds score directors.
pub trait ScoreDirectorFactory<S: PlanningSolution>: Send + Sync {
    /// The director type produced by this factory.
    type Director: ScoreDirector<S>;

    /// Creates a new score director owning `solution`.
    fn build_score_director(&self, solution: S) -> Self::Director;
}

/// Factory for [`SimpleScoreDirector`]s sharing one calculator function.
pub struct SimpleScoreDirectorFactory<S, C> {
    score_calculator: C,
    _phantom: PhantomData<fn() -> S>,
}

impl<S, C> SimpleScoreDirectorFactory<S, C>
where
    S: PlanningSolution,
    C: Fn(&S) -> S::Score + Clone + Send + Sync,
{
    pub fn new(score_calculator: C) -> Self {
        Self {
            score_calculator,
            _phantom: PhantomData,
        }
    }
}

impl<S, C> ScoreDirectorFactory<S> for SimpleScoreDirectorFactory<S, C>
where
    S: PlanningSolution,
    C: Fn(&S) -> S::Score + Clone + Send + Sync,
{
    type Director = SimpleScoreDirector<S, C>;

    fn build_score_director(&self, solution: S) -> Self::Director {
        SimpleScoreDirector::new(solution, self.score_calculator.clone())
    }
}

/// Factory for [`IncrementalScoreDirector`]s.
///
/// Each director gets a fresh calculator from the constructor. The same
/// constructor also backs from-scratch scoring for the assert modes, unless
/// an explicit assertion score function is configured.
///
/// ```
/// use tessera_core::{PlanningSolution, SimpleScore};
/// use tessera_scoring::{
///     IncrementalScoreCalculator, IncrementalScoreDirectorFactory, ScoreDirector,
///     ScoreDirectorFactory,
/// };
///
/// #[derive(Clone)]
/// struct Row { cells: Vec<i64>, score: Option<SimpleScore> }
///
/// impl PlanningSolution for Row {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<SimpleScore> { self.score }
///     fn set_score(&mut self, score: Option<SimpleScore>) { self.score = score; }
/// }
///
/// #[derive(Default)]
/// struct Negatives { count: i64 }
///
/// impl IncrementalScoreCalculator<Row> for Negatives {
///     fn reset_working_solution(&mut self, r: &Row) {
///         self.count = r.cells.iter().filter(|&&c| c < 0).count() as i64;
///     }
///     fn before_variable_changed(&mut self, r: &Row, i: usize, _: &str) {
///         if r.cells[i] < 0 { self.count -= 1; }
///     }
///     fn after_variable_changed(&mut self, r: &Row, i: usize, _: &str) {
///         if r.cells[i] < 0 { self.count += 1; }
///     }
///     fn calculate_score(&self) -> SimpleScore { SimpleScore::of(-self.count) }
/// }
///
/// let factory = IncrementalScoreDirectorFactory::new(Negatives::default);
/// let mut director = factory.build_score_director(Row { cells: vec![-1, 2, -3], score: None });
/// assert_eq!(director.calculate_score(), SimpleScore::of(-2));
/// ```
pub struct IncrementalScoreDirectorFactory<S: PlanningSolution, C> {
    constructor: CalculatorConstructor<C>,
    assertion_score_fn: Option<AssertionScoreFn<S>>,
}

impl<S, C> IncrementalScoreDirectorFactory<S, C>
where
    S: PlanningSolution,
    C: IncrementalScoreCalculator<S> + 'static,
{
    /// Creates a factory from a calculator constructor.
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            constructor: Arc::new(constructor),
            assertion_score_fn: None,
        }
    }

    /// Uses `score_fn` for from-scratch scoring in the assert modes.
    pub fn with_assertion_score_fn<F>(mut self, score_fn: F) -> Self
    where
        F: Fn(&S) -> S::Score + Send + Sync + 'static,
    {
        self.assertion_score_fn = Some(Arc::new(score_fn));
        self
    }
}

impl<S, C> ScoreDirectorFactory<S> for IncrementalScoreDirectorFactory<S, C>
where
    S: PlanningSolution,
    C: IncrementalScoreCalculator<S> + 'static,
{
    type Director = IncrementalScoreDirector<S, C>;

    fn build_score_director(&self, solution: S) -> Self::Director {
        let director = IncrementalScoreDirector::new(solution, (self.constructor)())
            .with_fresh_calculator(Arc::clone(&self.constructor));
        match &self.assertion_score_fn {
            Some(score_fn) => director.with_assertion_score_fn(Arc::clone(score_fn)),
            None => director,
        }
    }
}

impl<S: PlanningSolution, C> fmt::Debug for IncrementalScoreDirectorFactory<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalScoreDirectorFactory")
            .field("has_assertion_score_fn", &self.assertion_score_fn.is_some())
            .finish()
    }
}

/// Wraps every director built by the inner factory in a
/// [`ShadowAwareScoreDirector`].
pub struct ShadowAwareScoreDirectorFactory<F> {
    inner: F,
}

impl<F> ShadowAwareScoreDirectorFactory<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<S, F> ScoreDirectorFactory<S> for ShadowAwareScoreDirectorFactory<F>
where
    S: ShadowVariableSupport,
    F: ScoreDirectorFactory<S>,
{
    type Director = ShadowAwareScoreDirector<S, F::Director>;

    fn build_score_director(&self, solution: S) -> Self::Director {
        ShadowAwareScoreDirector::new(self.inner.build_score_director(solution))
    }
}
