//! Core domain traits

use crate::score::Score;

/// A planning problem together with its current, possibly partial, answer.
///
/// The solution owns the entities whose planning variables the solver
/// assigns, the facts they refer to, and the last calculated score.
///
/// ```
/// use tessera_core::{PlanningSolution, SimpleScore};
///
/// #[derive(Clone)]
/// struct Seating {
///     seats: Vec<Option<usize>>,
///     score: Option<SimpleScore>,
/// }
///
/// impl PlanningSolution for Seating {
///     type Score = SimpleScore;
///
///     fn score(&self) -> Option<SimpleScore> {
///         self.score
///     }
///
///     fn set_score(&mut self, score: Option<SimpleScore>) {
///         self.score = score;
///     }
///
///     fn is_initialized(&self) -> bool {
///         self.seats.iter().all(Option::is_some)
///     }
/// }
///
/// let seating = Seating { seats: vec![Some(0), None], score: None };
/// assert!(!seating.is_initialized());
/// ```
///
/// Solutions are `Send + Sync` so that partitions can move onto part
/// threads; each value is still mutated only by the director that owns it.
pub trait PlanningSolution: Clone + Send + Sync + 'static {
    type Score: Score;

    /// The last calculated score, `None` if never scored.
    fn score(&self) -> Option<Self::Score>;

    fn set_score(&mut self, score: Option<Self::Score>);

    /// True once every planning variable is assigned.
    fn is_initialized(&self) -> bool {
        true
    }
}
