//! Basic planning variables.
//!
//! A basic variable gives every entity one optional value picked from a
//! fixed range `0..value_count`. The construction heuristic and local search
//! phases drive it through plain function pointers, so any solution type
//! can expose its variable without a derive.

use std::fmt;

use tessera_core::PlanningSolution;
use tessera_scoring::ScoreDirector;

/// Accessors for one basic planning variable of `S`.
///
/// ```
/// use tessera_solver::phase::basic::BasicVariable;
/// use tessera_test::nqueens::{self, NQueens};
///
/// let row = BasicVariable::new(
///     "row",
///     nqueens::queen_count,
///     nqueens::row_count,
///     nqueens::get_row,
///     nqueens::set_row,
/// );
/// let board = NQueens::with_rows(&[2, 0, 3, 1]);
/// assert_eq!(row.get(&board, 2), Some(3));
/// assert_eq!(row.entity_count(&board), 4);
/// ```
pub struct BasicVariable<S> {
    variable_name: &'static str,
    descriptor_index: usize,
    entity_count: fn(&S) -> usize,
    value_count: fn(&S) -> usize,
    getter: fn(&S, usize) -> Option<usize>,
    setter: fn(&mut S, usize, Option<usize>),
}

impl<S> Clone for BasicVariable<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for BasicVariable<S> {}

impl<S> fmt::Debug for BasicVariable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicVariable")
            .field("variable_name", &self.variable_name)
            .field("descriptor_index", &self.descriptor_index)
            .finish()
    }
}

impl<S: PlanningSolution> BasicVariable<S> {
    pub fn new(
        variable_name: &'static str,
        entity_count: fn(&S) -> usize,
        value_count: fn(&S) -> usize,
        getter: fn(&S, usize) -> Option<usize>,
        setter: fn(&mut S, usize, Option<usize>),
    ) -> Self {
        Self {
            variable_name,
            descriptor_index: 0,
            entity_count,
            value_count,
            getter,
            setter,
        }
    }

    /// Sets the entity descriptor index passed with change notifications.
    pub fn with_descriptor_index(mut self, descriptor_index: usize) -> Self {
        self.descriptor_index = descriptor_index;
        self
    }

    pub fn variable_name(&self) -> &'static str {
        self.variable_name
    }

    pub fn entity_count(&self, solution: &S) -> usize {
        (self.entity_count)(solution)
    }

    pub fn value_count(&self, solution: &S) -> usize {
        (self.value_count)(solution)
    }

    pub fn get(&self, solution: &S, entity_index: usize) -> Option<usize> {
        (self.getter)(solution, entity_index)
    }

    /// Assigns `value` through the director's change notifications.
    pub fn change<D>(&self, director: &mut D, entity_index: usize, value: Option<usize>)
    where
        D: ScoreDirector<S> + ?Sized,
    {
        director.before_variable_changed(self.descriptor_index, entity_index, self.variable_name);
        (self.setter)(director.working_solution_mut(), entity_index, value);
        director.after_variable_changed(self.descriptor_index, entity_index, self.variable_name);
    }

    /// Like [`change`](Self::change), registering an undo with the director.
    pub fn change_undoable<D>(&self, director: &mut D, entity_index: usize, value: Option<usize>)
    where
        D: ScoreDirector<S> + ?Sized,
    {
        let old_value = self.get(director.working_solution(), entity_index);
        self.change(director, entity_index, value);
        let setter = self.setter;
        director.register_undo(Box::new(move |solution: &mut S| {
            setter(solution, entity_index, old_value)
        }));
    }
}
